//! Error types for the run-task relay domain.
//!
//! [`ServiceError`] is what a port implementation reports when a call to the
//! governance service or the run service does not produce a usable answer.
//! Transport-level errors (e.g. `reqwest` failures) are converted into it by
//! the infrastructure crates so the workflow never sees HTTP library types.
//!
//! [`WorkflowError`] covers the conditions that end a workflow invocation
//! without a verdict being delivered. Business-rule failures (missing project
//! variable, critical compliance findings) are *not* errors; they are
//! reported as a failed [`crate::VerdictResult`].

use thiserror::Error;

// ---------------------------------------------------------------------------
// Service-call errors
// ---------------------------------------------------------------------------

/// A call to an external service failed.
///
/// None of these are retried: the invocation that made the call gives up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The request could not be sent or the response body could not be read.
    #[error("request failed: method: {method}, url: {url}: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// The service answered with a status other than 200 or 201.
    ///
    /// `body` is the raw response text, kept for diagnostics.
    #[error("url: {url}, method: {method}, status: {status}, body: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The service answered successfully but the body did not match the
    /// expected shape.
    #[error("could not decode response body from {url}: {body}")]
    Decode { url: String, body: String },

    /// The request body could not be serialised.
    #[error("could not encode request body: {message}")]
    Encode { message: String },
}

impl ServiceError {
    /// Returns the HTTP status code for [`ServiceError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow errors
// ---------------------------------------------------------------------------

/// Conditions that end a workflow invocation without delivering a verdict.
///
/// All of these are operator-visible only (process logs); the run service
/// receives no callback for them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// The inbound body could not be parsed as a task payload. No callback
    /// URL can be trusted, so nothing is reported.
    #[error("malformed task payload: {message}")]
    MalformedPayload { message: String },

    /// An external call made by the workflow failed.
    #[error("{operation} failed: {source}")]
    Service {
        /// Short description of the step that failed (e.g. `"fetch workspace variables"`).
        operation: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl WorkflowError {
    /// Wraps a [`ServiceError`] with the workflow step that produced it.
    pub fn service(operation: &'static str) -> impl FnOnce(ServiceError) -> Self {
        move |source| Self::Service { operation, source }
    }
}
