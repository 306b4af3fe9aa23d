//! Verdict rules.
//!
//! Turns workspace variables and governance data into the [`VerdictResult`]
//! reported to the run service. Everything here is pure; the workflow crate
//! sequences the calls that feed these functions.

use tracing::debug;

use crate::{
    ComplianceFinding, ComplianceFindings, CostSavings, ProjectId, Severity, VerdictResult,
    WorkspaceVariable,
};

/// Workspace variable that names the governance project for a workspace.
pub const PROJECT_VARIABLE_KEY: &str = "CLOUDTAMERIO_PROJECT";

const MISSING_PROJECT_MESSAGE: &str =
    "You must set the environment variable, CLOUDTAMERIO_PROJECT, as a workspace variable.";

const CRITICAL_FINDINGS_SENTENCE: &str = " You cannot have any critical findings.";

// ---------------------------------------------------------------------------
// Project resolution
// ---------------------------------------------------------------------------

/// Finds the governance project key among the workspace variables.
///
/// The first variable named [`PROJECT_VARIABLE_KEY`] decides the outcome;
/// later duplicates are never consulted. A `null` or empty value on that first
/// match means the project is unresolved.
pub fn resolve_project_id(variables: &[WorkspaceVariable]) -> Option<ProjectId> {
    let variable = variables.iter().find(|v| v.key == PROJECT_VARIABLE_KEY)?;
    let project = variable.value_as_string().and_then(ProjectId::new);
    if project.is_none() {
        debug!(sensitive = variable.sensitive, "project variable present but has no value");
    }
    project
}

/// Failure verdict sent when the workspace has no project variable.
pub fn missing_project_verdict() -> VerdictResult {
    VerdictResult::failed(MISSING_PROJECT_MESSAGE, "")
}

// ---------------------------------------------------------------------------
// Governance UI links
// ---------------------------------------------------------------------------

/// Builds deep links into the governance web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalLinks {
    base_url: String,
}

impl PortalLinks {
    /// `base_url` is the governance service root (without the `/api` suffix).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn savings_opportunities(&self, project: &ProjectId) -> String {
        format!("{}/portal/project/{project}/savings-opportunity", self.base_url)
    }

    pub fn compliance(&self, project: &ProjectId) -> String {
        format!("{}/portal/project/{project}/compliance", self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Savings
// ---------------------------------------------------------------------------

/// Savings verdict. There is no threshold: the result always passes.
///
/// Amounts are rounded half away from zero to whole dollars.
pub fn savings_verdict(
    project: &ProjectId,
    savings: &CostSavings,
    links: &PortalLinks,
) -> VerdictResult {
    let current = savings.current_monthly_cost.round();
    let potential = savings.potential_savings().round();
    VerdictResult::passed(
        format!(
            "For project {project}, the monthly forecast is ${current}. \
             You could be saving ${potential} per month through savings opportunities. \
             Click Details to view them."
        ),
        links.savings_opportunities(project),
    )
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

/// Number of findings in each severity bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub info: u64,
}

impl SeverityCounts {
    /// Tallies findings by severity. Findings with an unknown code are skipped.
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a ComplianceFinding>) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity() {
                Some(Severity::Critical) => counts.critical += 1,
                Some(Severity::High) => counts.high += 1,
                Some(Severity::Medium) => counts.medium += 1,
                Some(Severity::Low) => counts.low += 1,
                Some(Severity::Info) => counts.info += 1,
                None => {}
            }
        }
        counts
    }

    pub fn has_critical(&self) -> bool {
        self.critical > 0
    }
}

/// Compliance verdict. Fails when at least one critical finding is active.
///
/// The reported total is the number of findings returned, including any with
/// an unclassified severity.
pub fn compliance_verdict(
    project: &ProjectId,
    findings: &ComplianceFindings,
    links: &PortalLinks,
) -> VerdictResult {
    let counts = SeverityCounts::tally(&findings.items);
    let mut message = format!(
        "For project {project}, there are {} compliance findings. | Critical: {} | High: {} | \
         Medium: {} | Low: {} | Info: {} | Click Details to view them.",
        findings.items.len(),
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.info,
    );
    let url = links.compliance(project);

    if counts.has_critical() {
        message.push_str(CRITICAL_FINDINGS_SENTENCE);
        VerdictResult::failed(message, url)
    } else {
        VerdictResult::passed(message, url)
    }
}
