//! Run-task relay entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Wire observability**: install the `tracing-subscriber` stack (see
//!    [`telemetry`]). All spans and events emitted by every crate in the
//!    workspace flow through it.
//! 2. **Load configuration**: read [`config::RelayConfig`] from the
//!    environment. A missing value stops the process before any network call.
//! 3. **Construct infrastructure**: create the [`governance::GovernanceClient`]
//!    and [`run_service::RunServiceClient`] and inject them into the
//!    [`workflow::CallbackWorkflow`].
//! 4. **Serve**: run the webhook [`listener`] until Ctrl-C or SIGTERM, then
//!    drain the workflows still running so their verdicts are delivered.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use governance::GovernanceClient;
use listener::{DrainResult, TaskTracker};
use run_service::RunServiceClient;
use runtask::PortalLinks;
use tracing::{error, info, warn};
use workflow::CallbackWorkflow;

use crate::config::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = telemetry::init()?;

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration incomplete");
            return Err(err.into());
        }
    };
    info!(?config, "webhook starting");

    if config.governance_skip_tls_verify {
        warn!("TLS certificate validation disabled for the governance service");
    }

    let governance = GovernanceClient::new(
        &config.governance_url,
        config.governance_api_key(),
        config.governance_skip_tls_verify,
    )
    .context("failed to build governance client")?;
    let run_service = RunServiceClient::new(&config.run_service_url, config.run_service_api_key())
        .context("failed to build run-service client")?;

    let workflow = CallbackWorkflow::new(
        Arc::new(governance),
        Arc::new(run_service),
        PortalLinks::new(config.governance_url.clone()),
    );

    let tasks = TaskTracker::new();
    let served = listener::serve(
        config.listen_addr,
        listener::router(Arc::new(workflow), tasks.clone()),
        shutdown_signal(),
    )
    .await;

    match listener::drain(&tasks, config.drain_timeout).await {
        DrainResult::Complete => info!("webhook stopped"),
        DrainResult::Timeout { remaining } => {
            warn!(remaining, "webhook stopped with workflows unfinished");
        }
    }
    served.context("webhook listener stopped")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
