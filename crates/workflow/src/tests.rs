use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use runtask::{
    AccessToken, CallbackUrl, ComplianceFinding, ComplianceFindings, CostSavings, MonthlySpend,
    ServiceError, VerdictStatus, WorkspaceId, WorkspaceVariable, PROJECT_VARIABLE_KEY,
};

use super::*;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Report {
    callback: String,
    token: String,
    verdict: VerdictResult,
}

struct FakeRunService {
    variables: Result<Vec<WorkspaceVariable>, ServiceError>,
    report_error: Option<ServiceError>,
    reports: Mutex<Vec<Report>>,
}

impl FakeRunService {
    fn with_variables(variables: Vec<WorkspaceVariable>) -> Self {
        Self {
            variables: Ok(variables),
            report_error: None,
            reports: Mutex::new(Vec::new()),
        }
    }

    fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunService for FakeRunService {
    async fn workspace_variables(
        &self,
        _workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, ServiceError> {
        self.variables.clone()
    }

    async fn post_task_result(
        &self,
        callback: &CallbackUrl,
        access_token: &AccessToken,
        result: &VerdictResult,
    ) -> Result<(), ServiceError> {
        self.reports.lock().unwrap().push(Report {
            callback: callback.to_string(),
            token: access_token.expose().to_string(),
            verdict: result.clone(),
        });
        match &self.report_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct FakeGovernance {
    savings: CostSavings,
    findings: ComplianceFindings,
    fail_with: Option<ServiceError>,
    calls: AtomicUsize,
}

impl FakeGovernance {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: &T) -> Result<T, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(value.clone()),
        }
    }
}

#[async_trait]
impl GovernanceService for FakeGovernance {
    async fn monthly_spend(&self, _project: &ProjectId) -> Result<MonthlySpend, ServiceError> {
        self.answer(&MonthlySpend {
            spend: 400.0,
            estimate: 1000.0,
        })
    }

    async fn cost_savings(&self, _project: &ProjectId) -> Result<CostSavings, ServiceError> {
        self.answer(&self.savings)
    }

    async fn compliance_findings(
        &self,
        _project: &ProjectId,
    ) -> Result<ComplianceFindings, ServiceError> {
        self.answer(&self.findings)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CALLBACK: &str = "https://runs.example.com/api/v2/task-results/tr-1/callback";

fn payload() -> TaskPayload {
    TaskPayload::from_json(
        serde_json::json!({
            "payload_version": 1,
            "access_token": "run-token",
            "task_result_callback_url": CALLBACK,
            "workspace_id": "ws-1",
            "run_id": "run-1"
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap()
}

fn project_variable(value: &str) -> WorkspaceVariable {
    WorkspaceVariable {
        key: PROJECT_VARIABLE_KEY.to_string(),
        value: serde_json::json!(value),
        sensitive: false,
        category: "env".to_string(),
    }
}

fn finding(severity: i64) -> ComplianceFinding {
    ComplianceFinding {
        severity_type_id: severity,
        ..ComplianceFinding::default()
    }
}

fn workflow(
    governance: Arc<FakeGovernance>,
    run_service: Arc<FakeRunService>,
) -> CallbackWorkflow {
    CallbackWorkflow::new(
        governance,
        run_service,
        PortalLinks::new("https://gov.example.com"),
    )
}

fn transport_error() -> ServiceError {
    ServiceError::Transport {
        method: "GET".into(),
        url: "https://gov.example.com/api".into(),
        message: "connection refused".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_project_reports_one_failure_without_governance_calls() {
    let governance = Arc::new(FakeGovernance::default());
    let run_service = Arc::new(FakeRunService::with_variables(vec![WorkspaceVariable {
        key: "AWS_REGION".into(),
        value: serde_json::json!("us-east-1"),
        sensitive: false,
        category: "env".into(),
    }]));

    let outcome = workflow(governance.clone(), run_service.clone())
        .run(Some(Action::Savings), &payload())
        .await
        .unwrap();

    let reports = run_service.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].callback, CALLBACK);
    assert_eq!(reports[0].token, "run-token");
    assert_eq!(reports[0].verdict.status, VerdictStatus::Failed);
    assert!(reports[0].verdict.message.contains(PROJECT_VARIABLE_KEY));
    assert_eq!(governance.calls(), 0);
    assert_eq!(outcome, WorkflowOutcome::Reported(reports[0].verdict.clone()));
}

#[tokio::test]
async fn missing_project_is_reported_even_without_an_action() {
    let governance = Arc::new(FakeGovernance::default());
    let run_service = Arc::new(FakeRunService::with_variables(Vec::new()));

    workflow(governance.clone(), run_service.clone())
        .run(None, &payload())
        .await
        .unwrap();

    assert_eq!(run_service.reports().len(), 1);
    assert_eq!(governance.calls(), 0);
}

#[tokio::test]
async fn savings_reports_rounded_amounts_and_passes() {
    let governance = Arc::new(FakeGovernance {
        savings: CostSavings {
            current_monthly_cost: 1000.4,
            potential_monthly_cost: 750.6,
            ..CostSavings::default()
        },
        ..FakeGovernance::default()
    });
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    workflow(governance.clone(), run_service.clone())
        .run(Some(Action::Savings), &payload())
        .await
        .unwrap();

    let reports = run_service.reports();
    assert_eq!(reports.len(), 1);
    let verdict = &reports[0].verdict;
    assert_eq!(verdict.status, VerdictStatus::Passed);
    assert!(verdict.message.contains("$1000"));
    assert!(verdict.message.contains("$250 per month"));
    assert_eq!(
        verdict.url,
        "https://gov.example.com/portal/project/42/savings-opportunity"
    );
    assert_eq!(reports[0].token, "run-token");
    // spend + savings
    assert_eq!(governance.calls(), 2);
}

#[tokio::test]
async fn critical_compliance_findings_fail_the_run() {
    let governance = Arc::new(FakeGovernance {
        findings: ComplianceFindings {
            total: 4,
            items: vec![finding(5), finding(5), finding(3), finding(1)],
        },
        ..FakeGovernance::default()
    });
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    workflow(governance.clone(), run_service.clone())
        .run(Some(Action::Compliance), &payload())
        .await
        .unwrap();

    let reports = run_service.reports();
    assert_eq!(reports.len(), 1);
    let verdict = &reports[0].verdict;
    assert_eq!(verdict.status, VerdictStatus::Failed);
    assert!(verdict.message.contains("Critical: 2"));
    assert!(verdict.message.contains("You cannot have any critical findings."));
    assert_eq!(governance.calls(), 1);
}

#[tokio::test]
async fn compliance_without_critical_findings_passes() {
    let governance = Arc::new(FakeGovernance {
        findings: ComplianceFindings {
            total: 3,
            items: vec![finding(4), finding(3), finding(2)],
        },
        ..FakeGovernance::default()
    });
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    workflow(governance, run_service.clone())
        .run(Some(Action::Compliance), &payload())
        .await
        .unwrap();

    assert_eq!(run_service.reports()[0].verdict.status, VerdictStatus::Passed);
}

#[tokio::test]
async fn unrecognised_action_sends_nothing() {
    let governance = Arc::new(FakeGovernance::default());
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    let outcome = workflow(governance.clone(), run_service.clone())
        .run(None, &payload())
        .await
        .unwrap();

    assert_eq!(outcome, WorkflowOutcome::NoAction);
    assert!(run_service.reports().is_empty());
    assert_eq!(governance.calls(), 0);
}

#[tokio::test]
async fn variable_fetch_failure_aborts_without_callback() {
    let governance = Arc::new(FakeGovernance::default());
    let run_service = Arc::new(FakeRunService {
        variables: Err(ServiceError::Status {
            method: "GET".into(),
            url: "https://runs.example.com/api/v2/workspaces/ws-1/vars".into(),
            status: 401,
            body: "unauthorized".into(),
        }),
        report_error: None,
        reports: Mutex::new(Vec::new()),
    });

    let err = workflow(governance, run_service.clone())
        .run(Some(Action::Savings), &payload())
        .await
        .unwrap_err();

    match err {
        WorkflowError::Service { operation, source } => {
            assert_eq!(operation, "fetch workspace variables");
            assert_eq!(source.status(), Some(401));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(run_service.reports().is_empty());
}

#[tokio::test]
async fn governance_failure_aborts_without_callback() {
    let governance = Arc::new(FakeGovernance {
        fail_with: Some(transport_error()),
        ..FakeGovernance::default()
    });
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    let err = workflow(governance.clone(), run_service.clone())
        .run(Some(Action::Savings), &payload())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Service {
            operation: "fetch monthly spend",
            ..
        }
    ));
    assert!(run_service.reports().is_empty());
    // no retry
    assert_eq!(governance.calls(), 1);
}

#[tokio::test]
async fn callback_failure_is_surfaced_after_one_attempt() {
    let governance = Arc::new(FakeGovernance::default());
    let run_service = Arc::new(FakeRunService {
        variables: Ok(vec![project_variable("42")]),
        report_error: Some(transport_error()),
        reports: Mutex::new(Vec::new()),
    });

    let err = workflow(governance, run_service.clone())
        .run(Some(Action::Compliance), &payload())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Service {
            operation: "report task result",
            ..
        }
    ));
    assert_eq!(run_service.reports().len(), 1);
}

#[tokio::test]
async fn handle_swallows_errors() {
    let governance = Arc::new(FakeGovernance {
        fail_with: Some(transport_error()),
        ..FakeGovernance::default()
    });
    let run_service = Arc::new(FakeRunService::with_variables(vec![project_variable("42")]));

    workflow(governance, run_service.clone())
        .handle(Some(Action::Compliance), payload())
        .await;

    assert!(run_service.reports().is_empty());
}
