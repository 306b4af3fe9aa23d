//! Shared value types for the run-task relay domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the data that flows through one workflow invocation: the inbound
//! [`TaskPayload`], the run-service [`WorkspaceVariable`]s, the governance
//! data shapes, and the outbound [`VerdictResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{AccessToken, CallbackUrl, RunId, WorkflowError, WorkspaceId};

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

// Both services send `null` for values they do not have. A container-level
// `#[serde(default)]` only covers absent fields, so every non-optional field
// below also goes through this.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Optional identifiers: `null`, absent and `""` all decode as `None`.
fn optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<String>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|v| T::try_from(v).ok()))
}

// ---------------------------------------------------------------------------
// Inbound payload
// ---------------------------------------------------------------------------

/// The JSON body the run service sends when a run reaches a task checkpoint.
///
/// Only `access_token`, `task_result_callback_url` and `workspace_id` are
/// required; the remaining run, workspace and organisation metadata is
/// informational and defaults when absent or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Version of the payload schema (currently `1`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload_version: u32,

    /// Run-scoped token used to authenticate the verdict callback.
    pub access_token: AccessToken,

    /// Identifier of the task result this invocation reports on.
    #[serde(default)]
    pub task_result_id: Option<String>,

    /// `advisory` or `mandatory`; how the run service treats a failed verdict.
    #[serde(default)]
    pub task_result_enforcement_level: Option<String>,

    /// Absolute URL the verdict is PATCHed to.
    pub task_result_callback_url: CallbackUrl,

    #[serde(default)]
    pub run_app_url: Option<String>,

    #[serde(default, deserialize_with = "optional_id")]
    pub run_id: Option<RunId>,

    #[serde(default)]
    pub run_message: Option<String>,

    #[serde(default)]
    pub run_created_at: Option<Timestamp>,

    #[serde(default)]
    pub run_created_by: Option<String>,

    /// Workspace whose variables carry the governance project key.
    pub workspace_id: WorkspaceId,

    #[serde(default)]
    pub workspace_name: Option<String>,

    #[serde(default)]
    pub workspace_app_url: Option<String>,

    #[serde(default)]
    pub organization_name: Option<String>,

    #[serde(default)]
    pub plan_json_api_url: Option<String>,

    #[serde(default)]
    pub vcs_repo_url: Option<String>,

    #[serde(default)]
    pub vcs_branch: Option<String>,

    #[serde(default)]
    pub vcs_pull_request_url: Option<String>,

    #[serde(default)]
    pub vcs_commit_url: Option<String>,
}

impl TaskPayload {
    /// Parses an inbound request body.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MalformedPayload`] when the body is not JSON or
    /// lacks one of the required fields.
    pub fn from_json(body: &[u8]) -> Result<Self, WorkflowError> {
        serde_json::from_slice(body).map_err(|e| WorkflowError::MalformedPayload {
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Requested action
// ---------------------------------------------------------------------------

/// The governance check requested by the `action` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Report the project's monthly cost and potential savings. Always passes.
    Savings,
    /// Tally active compliance findings. Fails on any critical finding.
    Compliance,
}

impl Action {
    /// Parses the query-string value. Matching is case-sensitive; anything
    /// other than `savings` or `compliance` yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "savings" => Some(Self::Savings),
            "compliance" => Some(Self::Compliance),
            _ => None,
        }
    }

    /// Returns the query-string form of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Compliance => "compliance",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Run-service workspace variables
// ---------------------------------------------------------------------------

/// A workspace variable as seen by the domain.
///
/// `value` is kept as raw JSON: the run service returns strings for ordinary
/// variables, `null` for sensitive ones, and occasionally other scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceVariable {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sensitive: bool,
    /// `terraform` or `env`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
}

impl WorkspaceVariable {
    /// Returns the value coerced to a string.
    ///
    /// JSON strings are returned verbatim; any other non-null scalar is
    /// rendered as its JSON text (`42` becomes `"42"`). `null` yields `None`.
    pub fn value_as_string(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Governance data
// ---------------------------------------------------------------------------


/// Month-to-date spend and end-of-month estimate for a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlySpend {
    #[serde(deserialize_with = "null_as_default")]
    pub spend: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub estimate: f64,
}

/// Cost and savings-opportunity summary for a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSavings {
    #[serde(deserialize_with = "null_as_default")]
    pub current_monthly_cost: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub potential_monthly_cost: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub decommission_savings: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub rightsizing_savings: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub month_count: u32,
}

impl CostSavings {
    /// Monthly cost that could be saved by acting on every opportunity.
    pub fn potential_savings(&self) -> f64 {
        self.current_monthly_cost - self.potential_monthly_cost
    }
}

/// Active compliance findings for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceFindings {
    /// Total reported by the governance service. The verdict counts `items`.
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<ComplianceFinding>,
}

/// One compliance finding together with its check, account and project metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceFinding {
    #[serde(deserialize_with = "null_as_default")]
    pub finding: FindingResource,
    #[serde(deserialize_with = "null_as_default")]
    pub standard_id: i64,
    pub standard_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub check_id: i64,
    pub check_name: Option<String>,
    /// Raw severity code; see [`Severity::from_code`].
    #[serde(deserialize_with = "null_as_default")]
    pub severity_type_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub account_id: i64,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub project_id: i64,
    pub project_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_ou_id: i64,
    pub parent_ou_name: Option<String>,
    pub region: Option<String>,
    pub created_at: Option<String>,
    pub archived_at: Option<String>,
}

impl ComplianceFinding {
    /// Returns the classified severity, or `None` for an unknown code.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_code(self.severity_type_id)
    }
}

/// The cloud resource a compliance finding was raised against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindingResource {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub hash_identifier: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub compliance_check_scan_id: i64,
    pub resource_type: Option<String>,
    pub resource_name: Option<String>,
}

/// Compliance finding severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Maps the governance service's numeric severity code.
    ///
    /// `1` = info through `5` = critical; any other code is unclassified.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Info),
            2 => Some(Self::Low),
            3 => Some(Self::Medium),
            4 => Some(Self::High),
            5 => Some(Self::Critical),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound verdict
// ---------------------------------------------------------------------------

/// Outcome reported to the run service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Passed,
    Failed,
}

impl VerdictStatus {
    /// Returns the wire form (`passed` / `failed`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pass/fail verdict, message and deep link sent to the callback URL.
///
/// Constructed fresh per invocation and sent exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResult {
    pub status: VerdictStatus,
    /// Human-readable summary shown in the run service's UI.
    pub message: String,
    /// Deep link into the governance UI; empty when there is nothing to link to.
    pub url: String,
}

impl VerdictResult {
    /// Creates a passing verdict.
    pub fn passed(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Passed,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Creates a failing verdict.
    pub fn failed(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Failed,
            message: message.into(),
            url: url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
