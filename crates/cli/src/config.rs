//! Process configuration read from the environment at start-up.
//!
//! Loaded once and injected into the clients and the workflow; request
//! handling never reads the environment.
//!
//! ## Variables
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `CLOUDTAMERIO_URL` | yes | |
//! | `CLOUDTAMERIO_APIKEY` | yes | |
//! | `TERRAFORM_APIKEY` | yes | |
//! | `TERRAFORM_URL` | no | `https://app.terraform.io` |
//! | `RELAY_LISTEN_ADDR` | no | `0.0.0.0:8080` |
//! | `CLOUDTAMERIO_SKIP_TLS_VERIFY` | no | `false` |
//! | `RELAY_DRAIN_TIMEOUT_SECS` | no | `25` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const GOVERNANCE_URL_VAR: &str = "CLOUDTAMERIO_URL";
pub const GOVERNANCE_API_KEY_VAR: &str = "CLOUDTAMERIO_APIKEY";
pub const RUN_SERVICE_API_KEY_VAR: &str = "TERRAFORM_APIKEY";
pub const RUN_SERVICE_URL_VAR: &str = "TERRAFORM_URL";
pub const LISTEN_ADDR_VAR: &str = "RELAY_LISTEN_ADDR";
pub const SKIP_TLS_VERIFY_VAR: &str = "CLOUDTAMERIO_SKIP_TLS_VERIFY";
pub const DRAIN_TIMEOUT_VAR: &str = "RELAY_DRAIN_TIMEOUT_SECS";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("env variable missing: {name}")]
    Missing { name: &'static str },

    #[error("invalid value for {name} ('{value}'): {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Validated relay configuration.
#[derive(Clone)]
pub struct RelayConfig {
    /// Governance service root, without trailing slash.
    pub governance_url: String,
    governance_api_key: String,
    pub governance_skip_tls_verify: bool,
    /// Run service root, without trailing slash.
    pub run_service_url: String,
    run_service_api_key: String,
    pub listen_addr: SocketAddr,
    /// How long shutdown waits for in-flight workflows.
    pub drain_timeout: Duration,
}

impl RelayConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value of a
    /// variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] for an unset or empty required variable;
    /// [`ConfigError::Invalid`] for an unparseable optional one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| value(name).ok_or(ConfigError::Missing { name });

        let governance_url = trim_url(required(GOVERNANCE_URL_VAR)?);
        let governance_api_key = required(GOVERNANCE_API_KEY_VAR)?;
        let run_service_api_key = required(RUN_SERVICE_API_KEY_VAR)?;

        let run_service_url = trim_url(
            value(RUN_SERVICE_URL_VAR).unwrap_or_else(|| run_service::DEFAULT_BASE_URL.to_string()),
        );

        let listen_addr = value(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: LISTEN_ADDR_VAR,
                value: listen_addr.clone(),
                reason: e.to_string(),
            })?;

        let governance_skip_tls_verify = match value(SKIP_TLS_VERIFY_VAR) {
            Some(raw) => parse_flag(SKIP_TLS_VERIFY_VAR, &raw)?,
            None => false,
        };

        let drain_timeout = match value(DRAIN_TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: DRAIN_TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_DRAIN_TIMEOUT,
        };

        Ok(Self {
            governance_url,
            governance_api_key,
            governance_skip_tls_verify,
            run_service_url,
            run_service_api_key,
            listen_addr,
            drain_timeout,
        })
    }

    pub fn governance_api_key(&self) -> &str {
        &self.governance_api_key
    }

    pub fn run_service_api_key(&self) -> &str {
        &self.run_service_api_key
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("governance_url", &self.governance_url)
            .field("governance_skip_tls_verify", &self.governance_skip_tls_verify)
            .field("run_service_url", &self.run_service_url)
            .field("listen_addr", &self.listen_addr)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
