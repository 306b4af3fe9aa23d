//! Run-service adapter.
//!
//! Implements the [`runtask::RunService`] trait against the run-orchestration
//! platform's JSON:API endpoints.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** JSON:API document shapes, the `application/vnd.api+json`
//! content type, and credential switching live here. The workflow sees only
//! [`runtask::RunService`] and the domain types it returns.
//!
//! ## Credentials
//!
//! Two credentials are in play for one run:
//!
//! - the relay's service API key, used to read workspace variables;
//! - the run's own access token from the task payload, used for the callback
//!   PATCH because the callback endpoint authorises against the run.
//!
//! The client value holds only the service key. The run token is applied per
//! call through [`rest_client::RestClient::with_token`], so a single client can
//! serve concurrent invocations.

mod documents;

use async_trait::async_trait;
use rest_client::{ClientConfig, Method, RestClient, RestError};
use runtask::{
    AccessToken, CallbackUrl, RunService, ServiceError, VerdictResult, WorkspaceId,
    WorkspaceVariable,
};
use tracing::{debug, info};

use crate::documents::{TaskResultDocument, TaskResultResponse, VariablesDocument};

/// Content type required by the run service's API.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Default public run-service root.
pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io";

/// Client for the run service.
#[derive(Debug, Clone)]
pub struct RunServiceClient {
    rest: RestClient,
}

impl RunServiceClient {
    /// Creates a client for the run service rooted at `base_url` (without the
    /// `/api/v2` suffix), authenticated with the relay's service `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Build`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, RestError> {
        let config =
            ClientConfig::new(api_base(base_url), api_key).with_content_type(JSON_API_CONTENT_TYPE);
        Ok(Self::from_rest(RestClient::new(config)?))
    }

    /// Wraps an already-configured [`RestClient`] whose base URL ends in `/api/v2`.
    pub fn from_rest(rest: RestClient) -> Self {
        Self { rest }
    }

    /// Lists the variables of `workspace` with the service credential.
    pub async fn get_workspace_variables(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, RestError> {
        let response = self
            .rest
            .get::<VariablesDocument>(&format!("/workspaces/{workspace}/vars"))
            .await?;
        debug!(
            workspace = %workspace,
            count = response.data.data.len(),
            "workspace variables received"
        );
        Ok(response.data.into_variables())
    }

    /// PATCHes `result` to the absolute `callback` URL as the run.
    ///
    /// The response body, when present, is inspected only for logging; an
    /// unexpected shape there does not fail the call.
    pub async fn post_task_result(
        &self,
        callback: &CallbackUrl,
        access_token: &AccessToken,
        result: &VerdictResult,
    ) -> Result<(), RestError> {
        let document = TaskResultDocument::from_verdict(result);
        let raw = self
            .rest
            .with_token(access_token.expose())
            .send(Method::PATCH, callback.as_str(), Some(&document))
            .await?;

        if raw.body.trim().is_empty() {
            info!(status = %result.status, "task result reported");
            return Ok(());
        }
        match raw.json::<TaskResultResponse>() {
            Ok(response) => info!(
                status = %result.status,
                recorded_status = response.recorded_status().unwrap_or("unknown"),
                "task result reported"
            ),
            Err(err) => debug!(error = %err, "task result response not recognised"),
        }
        Ok(())
    }
}

fn api_base(base_url: &str) -> String {
    format!("{}/api/v2", base_url.trim_end_matches('/'))
}

#[async_trait]
impl RunService for RunServiceClient {
    async fn workspace_variables(
        &self,
        workspace: &WorkspaceId,
    ) -> Result<Vec<WorkspaceVariable>, ServiceError> {
        Ok(self.get_workspace_variables(workspace).await?)
    }

    async fn post_task_result(
        &self,
        callback: &CallbackUrl,
        access_token: &AccessToken,
        result: &VerdictResult,
    ) -> Result<(), ServiceError> {
        Ok(RunServiceClient::post_task_result(self, callback, access_token, result).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RunServiceClient {
        RunServiceClient::new(&server.uri(), "svc-key").unwrap()
    }

    #[tokio::test]
    async fn lists_workspace_variables_with_service_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/workspaces/ws-1/vars"))
            .and(header("Authorization", "Bearer svc-key"))
            .and(header("Content-Type", JSON_API_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {
                        "id": "var-1",
                        "type": "vars",
                        "attributes": {
                            "key": "CLOUDTAMERIO_PROJECT",
                            "value": "42",
                            "sensitive": false,
                            "category": "env",
                            "hcl": false,
                            "created-at": "2021-09-02T14:47:13.036Z",
                            "description": null
                        },
                        "relationships": {
                            "configurable": {
                                "data": {"id": "ws-1", "type": "workspaces"},
                                "links": {"related": "/api/v2/organizations/org/workspaces/ws"}
                            }
                        },
                        "links": {"self": "/api/v2/workspaces/ws-1/vars/var-1"}
                    },
                    {
                        "id": "var-2",
                        "type": "vars",
                        "attributes": {"key": "SECRET", "value": null, "sensitive": true}
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let workspace = WorkspaceId::new("ws-1").unwrap();
        let vars = client_for(&server)
            .workspace_variables(&workspace)
            .await
            .unwrap();

        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].key, "CLOUDTAMERIO_PROJECT");
        assert_eq!(vars[0].value_as_string().as_deref(), Some("42"));
        assert!(vars[1].sensitive);
        assert_eq!(vars[1].value_as_string(), None);
    }

    #[tokio::test]
    async fn patches_verdict_to_absolute_callback_as_the_run() {
        let api = MockServer::start().await;
        let callback_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/task-results/tr-1/callback"))
            .and(header("Authorization", "Bearer run-token"))
            .and(header("Content-Type", JSON_API_CONTENT_TYPE))
            .and(body_json(serde_json::json!({
                "data": {
                    "type": "task-results",
                    "attributes": {
                        "status": "passed",
                        "message": "all good",
                        "url": "https://gov.example.com/portal"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "id": "taskrs-1",
                    "type": "task-results",
                    "attributes": {"status": "passed", "message": "all good"}
                }
            })))
            .expect(1)
            .mount(&callback_server)
            .await;

        let callback =
            CallbackUrl::new(format!("{}/task-results/tr-1/callback", callback_server.uri()))
                .unwrap();
        let verdict = VerdictResult::passed("all good", "https://gov.example.com/portal");

        RunService::post_task_result(
            &client_for(&api),
            &callback,
            &AccessToken::new("run-token"),
            &verdict,
        )
        .await
        .unwrap();

        assert!(api.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_callback_response_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/cb"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let callback = CallbackUrl::new(format!("{}/cb", server.uri())).unwrap();
        client_for(&server)
            .post_task_result(
                &callback,
                &AccessToken::new("t"),
                &VerdictResult::failed("no", ""),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_callback_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/cb"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid status"))
            .mount(&server)
            .await;

        let callback = CallbackUrl::new(format!("{}/cb", server.uri())).unwrap();
        let err = RunService::post_task_result(
            &client_for(&server),
            &callback,
            &AccessToken::new("t"),
            &VerdictResult::passed("ok", ""),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("PATCH"));
    }

    #[test]
    fn api_base_appends_version_prefix() {
        assert_eq!(api_base("https://app.terraform.io/"), "https://app.terraform.io/api/v2");
    }
}
