//! Core domain for the run-task relay.
//!
//! This crate contains every domain concept the relay works with: the inbound
//! task payload sent by the run service, the verdict reported back to it, the
//! read-only governance data used to compute that verdict, and the two rules
//! (savings and compliance) that turn data into a verdict. Infrastructure
//! crates implement the port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ProjectId`, `WorkspaceId`, `AccessToken`, etc.) |
//! | [`types`] | Task payload, verdict result, workspace variables, governance data shapes |
//! | [`verdict`] | Project resolution and the savings / compliance verdict rules |
//! | [`ports`] | `GovernanceService` and `RunService` traits |
//! | [`errors`] | Service-call and workflow error types |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;
pub mod verdict;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ServiceError, WorkflowError};
pub use identifiers::{
    AccessToken, CallbackUrl, EmptyIdentifier, InvocationId, ProjectId, RunId, WorkspaceId,
};
pub use ports::{GovernanceService, RunService};
pub use types::{
    Action, ComplianceFinding, ComplianceFindings, CostSavings, FindingResource, MonthlySpend,
    Severity, TaskPayload, Timestamp, VerdictResult, VerdictStatus, WorkspaceVariable,
};
pub use verdict::{
    compliance_verdict, missing_project_verdict, resolve_project_id, savings_verdict, PortalLinks,
    SeverityCounts, PROJECT_VARIABLE_KEY,
};
