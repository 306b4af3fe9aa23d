//! Port traits implemented by the infrastructure crates.
//!
//! The workflow depends only on these traits. `governance` and `run-service`
//! supply the HTTP implementations; tests supply in-memory fakes.
//!
//! Credentials are passed per call where they vary per run, so one
//! implementation value can serve concurrent invocations without any of them
//! mutating shared state.

use async_trait::async_trait;

use crate::{
    AccessToken, CallbackUrl, ComplianceFindings, CostSavings, MonthlySpend, ProjectId,
    ServiceError, VerdictResult, WorkspaceId, WorkspaceVariable,
};

/// Read-only access to the governance service's cost and compliance data.
#[async_trait]
pub trait GovernanceService: Send + Sync {
    /// Month-to-date spend and end-of-month estimate for `project`.
    async fn monthly_spend(&self, project: &ProjectId) -> Result<MonthlySpend, ServiceError>;

    /// Current and potential monthly cost for `project`.
    async fn cost_savings(&self, project: &ProjectId) -> Result<CostSavings, ServiceError>;

    /// Active (non-archived) compliance findings for `project`.
    async fn compliance_findings(
        &self,
        project: &ProjectId,
    ) -> Result<ComplianceFindings, ServiceError>;
}

/// Access to the run service that originated the webhook call.
#[async_trait]
pub trait RunService: Send + Sync {
    /// Reads the variables of `workspace` using the relay's service credential.
    async fn workspace_variables(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, ServiceError>;

    /// PATCHes `result` to the absolute `callback` URL, authenticating as the
    /// run with `access_token`.
    async fn post_task_result(
        &self,
        callback: &CallbackUrl,
        access_token: &AccessToken,
        result: &VerdictResult,
    ) -> Result<(), ServiceError>;
}
