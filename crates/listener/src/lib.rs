//! Inbound webhook endpoint.
//!
//! Receives the run service's task payloads over HTTP and starts one
//! [`CallbackWorkflow`] invocation per accepted payload.
//!
//! ## Routes
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `POST /?action=<savings\|compliance>` | Parse the task payload; `200 OK` with `OK\n` once parsed, empty `200` if malformed |
//! | `GET /health` | Liveness probe |
//!
//! The response to `POST /` never reflects the workflow's outcome: the
//! workflow runs on a tracked task after the response is produced, and its
//! verdict reaches the run service through the callback URL. A malformed
//! payload is dropped without any outward failure report.
//!
//! ## Shutdown
//!
//! Workflows are spawned on a [`TaskTracker`]. After [`serve`] returns,
//! [`drain`] waits a bounded time for them so verdicts already in progress
//! are still delivered.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP framing and request parsing live here. The
//! workflow sees only an [`Action`] and a parsed [`TaskPayload`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use runtask::{Action, TaskPayload};
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use workflow::CallbackWorkflow;

// Re-exported so the binary can own the tracker without depending on tokio-util.
pub use tokio_util::task::TaskTracker;

/// Body returned for every accepted payload.
pub const ACCEPTED_BODY: &str = "OK\n";

/// Errors that stop the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Result of waiting for in-flight workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainResult {
    /// Every workflow finished before the timeout.
    Complete,
    /// The timeout elapsed with workflows still running.
    Timeout { remaining: usize },
}

#[derive(Clone)]
struct RelayState {
    workflow: Arc<CallbackWorkflow>,
    tasks: TaskTracker,
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    #[serde(default)]
    action: Option<String>,
}

/// Builds the webhook router around a shared workflow. Each accepted payload
/// runs on `tasks`.
pub fn router(workflow: Arc<CallbackWorkflow>, tasks: TaskTracker) -> Router {
    Router::new()
        .route("/", post(receive_task))
        .route("/health", get(health))
        .with_state(RelayState { workflow, tasks })
}

/// Binds `addr` and serves `router` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ListenerError::Bind`] if the address is unavailable and
/// [`ListenerError::Serve`] if the server stops on an I/O error.
pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown: F) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    info!(%addr, "webhook listener running");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)
}

/// Closes `tasks` and waits up to `timeout` for the workflows still running.
pub async fn drain(tasks: &TaskTracker, timeout: Duration) -> DrainResult {
    tasks.close();
    if tasks.is_empty() {
        return DrainResult::Complete;
    }
    info!(in_flight = tasks.len(), "waiting for in-flight workflows");

    match tokio::time::timeout(timeout, tasks.wait()).await {
        Ok(()) => DrainResult::Complete,
        Err(_) => {
            let remaining = tasks.len();
            warn!(remaining, "drain timeout exceeded, abandoning workflows");
            DrainResult::Timeout { remaining }
        }
    }
}

async fn receive_task(
    State(state): State<RelayState>,
    Query(query): Query<WebhookQuery>,
    body: Bytes,
) -> Response {
    let raw_action = query.action.unwrap_or_default();
    info!(action = %raw_action, "webhook received");

    let payload = match TaskPayload::from_json(&body) {
        Ok(payload) => payload,
        Err(err) => {
            debug!(error = %err, "dropping malformed task payload");
            return StatusCode::OK.into_response();
        }
    };

    let action = Action::parse(&raw_action);
    let workflow = state.workflow;
    state.tasks.spawn(async move {
        workflow.handle(action, payload).await;
    });

    (StatusCode::OK, ACCEPTED_BODY).into_response()
}

async fn health() -> &'static str {
    ACCEPTED_BODY
}
