//! Governance-service adapter.
//!
//! Implements the [`runtask::GovernanceService`] trait against the governance
//! platform's REST API: monthly spend, cost savings, and active compliance
//! findings, each addressed by project.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Endpoint paths, response envelopes, and authentication
//! live here. The workflow sees only [`runtask::GovernanceService`].
//!
//! ## Endpoints
//!
//! All paths are relative to `<governance url>/api` and authenticated with the
//! relay's governance API key as a bearer token:
//!
//! | Operation | Path |
//! |-----------|------|
//! | monthly spend | `/v3/project/{id}/spend/monthly` |
//! | cost savings | `/v1/cost-savings/cost-and-savings?...&project_id={id}&...` |
//! | compliance findings | `/v4/compliance/finding?project_id={id}&finding_type=active` |
//!
//! The project id is percent-encoded as one path segment or query value.
//!
//! Every response is wrapped in a `{"status": <code>, "data": <payload>}`
//! envelope.

use async_trait::async_trait;
use rest_client::{ClientConfig, RestClient, RestError};
use runtask::{
    ComplianceFindings, CostSavings, GovernanceService, MonthlySpend, ProjectId, ServiceError,
};
use serde::Deserialize;
use tracing::debug;

/// Response envelope shared by every governance endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: i64,
    data: T,
}

/// Client for the governance service.
#[derive(Debug, Clone)]
pub struct GovernanceClient {
    rest: RestClient,
}

impl GovernanceClient {
    /// Creates a client for the governance service rooted at `base_url`
    /// (the UI root, without `/api`).
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Build`] if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        accept_invalid_certs: bool,
    ) -> Result<Self, RestError> {
        let config = ClientConfig::new(api_base(base_url), api_key)
            .with_accept_invalid_certs(accept_invalid_certs);
        Ok(Self::from_rest(RestClient::new(config)?))
    }

    /// Wraps an already-configured [`RestClient`] whose base URL ends in `/api`.
    pub fn from_rest(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn get_monthly_spend(&self, project: &ProjectId) -> Result<MonthlySpend, RestError> {
        let url = self
            .rest
            .endpoint(&["v3", "project", project.as_str(), "spend", "monthly"], &[])?;
        self.get_data(&url).await
    }

    pub async fn get_cost_savings(&self, project: &ProjectId) -> Result<CostSavings, RestError> {
        let url = self.rest.endpoint(
            &["v1", "cost-savings", "cost-and-savings"],
            &[
                ("csp_type_id", "0"),
                ("service_id", "0"),
                ("project_id", project.as_str()),
                ("include_dismissed", "false"),
                ("projectFilter", "true"),
            ],
        )?;
        self.get_data(&url).await
    }

    pub async fn get_compliance_findings(
        &self,
        project: &ProjectId,
    ) -> Result<ComplianceFindings, RestError> {
        let url = self.rest.endpoint(
            &["v4", "compliance", "finding"],
            &[("project_id", project.as_str()), ("finding_type", "active")],
        )?;
        self.get_data(&url).await
    }

    async fn get_data<T>(&self, url: &str) -> Result<T, RestError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.rest.get::<Envelope<T>>(url).await?;
        debug!(
            url,
            status = response.data.status,
            total_items = response.pagination.total_items,
            "governance response received"
        );
        Ok(response.data.data)
    }
}

fn api_base(base_url: &str) -> String {
    format!("{}/api", base_url.trim_end_matches('/'))
}

#[async_trait]
impl GovernanceService for GovernanceClient {
    async fn monthly_spend(&self, project: &ProjectId) -> Result<MonthlySpend, ServiceError> {
        Ok(self.get_monthly_spend(project).await?)
    }

    async fn cost_savings(&self, project: &ProjectId) -> Result<CostSavings, ServiceError> {
        Ok(self.get_cost_savings(project).await?)
    }

    async fn compliance_findings(
        &self,
        project: &ProjectId,
    ) -> Result<ComplianceFindings, ServiceError> {
        Ok(self.get_compliance_findings(project).await?)
    }
}
