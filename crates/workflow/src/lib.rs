//! Run-task callback workflow.
//!
//! [`CallbackWorkflow`] drives one webhook invocation from an accepted task
//! payload to a delivered verdict:
//!
//! 1. **Fetch workspace variables** with the relay's service credential.
//! 2. **Resolve the project** from `CLOUDTAMERIO_PROJECT`. If it is missing, a
//!    failed verdict naming the variable is reported and the workflow ends.
//! 3. **Dispatch by action.** `savings` reads spend and cost savings;
//!    `compliance` reads active findings. No action means no callback.
//! 4. **Report** the verdict to the callback URL as the run.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The workflow sequences calls between the verdict
//! rules in [`runtask`] and the [`GovernanceService`] / [`RunService`] ports.
//! It contains no rules of its own.
//!
//! ## Failure handling
//!
//! Any failed external call ends the invocation with a [`WorkflowError`]; there
//! is no retry. Only business-rule failures reach the run service, as a
//! `failed` verdict.

use std::sync::Arc;

use runtask::{
    compliance_verdict, missing_project_verdict, resolve_project_id, savings_verdict, Action,
    GovernanceService, InvocationId, PortalLinks, ProjectId, RunService, TaskPayload,
    VerdictResult, WorkflowError,
};
use tracing::{error, info, info_span, warn, Instrument};

/// How an invocation ended when no error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// A verdict was delivered to the callback URL.
    Reported(VerdictResult),
    /// The project resolved but the action was not recognised; nothing was sent.
    NoAction,
}

/// Orchestrates one invocation per call to [`CallbackWorkflow::run`].
///
/// Holds no per-invocation state, so one value can be shared by concurrent
/// invocations behind an [`Arc`].
#[derive(Clone)]
pub struct CallbackWorkflow {
    governance: Arc<dyn GovernanceService>,
    run_service: Arc<dyn RunService>,
    portal: PortalLinks,
}

impl CallbackWorkflow {
    pub fn new(
        governance: Arc<dyn GovernanceService>,
        run_service: Arc<dyn RunService>,
        portal: PortalLinks,
    ) -> Self {
        Self {
            governance,
            run_service,
            portal,
        }
    }

    /// Runs the workflow inside its own span and logs the result.
    ///
    /// This is the entry point for detached invocations: the inbound request
    /// has already been acknowledged, so errors can only be logged.
    pub async fn handle(&self, action: Option<Action>, payload: TaskPayload) {
        let invocation = InvocationId::new_random();
        let span = info_span!(
            "callback_workflow",
            %invocation,
            run_id = payload.run_id.as_ref().map(|r| r.as_str()).unwrap_or(""),
            workspace_id = %payload.workspace_id,
            action = action.map(Action::as_str).unwrap_or(""),
        );

        async {
            match self.run(action, &payload).await {
                Ok(WorkflowOutcome::Reported(verdict)) => {
                    info!(status = %verdict.status, "workflow complete");
                }
                Ok(WorkflowOutcome::NoAction) => {
                    info!("workflow complete without callback");
                }
                Err(err) => {
                    let http_status = match &err {
                        WorkflowError::Service { source, .. } => source.status(),
                        WorkflowError::MalformedPayload { .. } => None,
                    };
                    error!(error = %err, http_status, "workflow aborted");
                }
            }
        }
        .instrument(span)
        .await;
    }

    /// Runs the workflow for one accepted payload.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Service`] naming the step whose external call
    /// failed. No callback is sent in that case unless the failing step was the
    /// callback itself.
    pub async fn run(
        &self,
        action: Option<Action>,
        payload: &TaskPayload,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let variables = self
            .run_service
            .workspace_variables(&payload.workspace_id)
            .await
            .map_err(WorkflowError::service("fetch workspace variables"))?;

        let Some(project) = resolve_project_id(&variables) else {
            warn!("workspace variable missing: {}", runtask::PROJECT_VARIABLE_KEY);
            return self.report(payload, missing_project_verdict()).await;
        };
        info!(project_id = %project, "project resolved");

        let verdict = match action {
            Some(Action::Savings) => self.savings(&project).await?,
            Some(Action::Compliance) => self.compliance(&project).await?,
            None => {
                warn!("unrecognised action; no result will be reported");
                return Ok(WorkflowOutcome::NoAction);
            }
        };

        self.report(payload, verdict).await
    }

    async fn savings(&self, project: &ProjectId) -> Result<VerdictResult, WorkflowError> {
        let spend = self
            .governance
            .monthly_spend(project)
            .await
            .map_err(WorkflowError::service("fetch monthly spend"))?;
        info!(spend = spend.spend, estimate = spend.estimate, "monthly spend");

        let savings = self
            .governance
            .cost_savings(project)
            .await
            .map_err(WorkflowError::service("fetch cost savings"))?;
        info!(potential_savings = savings.potential_savings(), "cost savings");

        Ok(savings_verdict(project, &savings, &self.portal))
    }

    async fn compliance(&self, project: &ProjectId) -> Result<VerdictResult, WorkflowError> {
        let findings = self
            .governance
            .compliance_findings(project)
            .await
            .map_err(WorkflowError::service("fetch compliance findings"))?;
        info!(findings = findings.items.len(), "compliance findings");

        Ok(compliance_verdict(project, &findings, &self.portal))
    }

    /// Delivers `verdict` with the run's own access token.
    async fn report(
        &self,
        payload: &TaskPayload,
        verdict: VerdictResult,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.run_service
            .post_task_result(
                &payload.task_result_callback_url,
                &payload.access_token,
                &verdict,
            )
            .await
            .map_err(WorkflowError::service("report task result"))?;
        Ok(WorkflowOutcome::Reported(verdict))
    }
}

impl std::fmt::Debug for CallbackWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackWorkflow")
            .field("portal", &self.portal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
