use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::{Pagination, RestError};

/// Content type sent when a client has no override configured.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for one [`RestClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix prepended verbatim to every relative request path.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header (NEVER log this value).
    token: String,
    /// `Content-Type` override; `None` sends [`DEFAULT_CONTENT_TYPE`].
    pub content_type: Option<String>,
    /// Skip TLS certificate validation.
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            content_type: None,
            accept_invalid_certs: false,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("content_type", &self.content_type)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A successful response whose body has been read but not decoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub pagination: Pagination,
    pub body: String,
}

impl RawResponse {
    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Decode`] with the raw body text when the body does
    /// not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RestError> {
        serde_json::from_str(&self.body).map_err(|source| RestError::Decode {
            url: self.url.clone(),
            body: self.body.clone(),
            source,
        })
    }
}

/// A successful response decoded into `T`.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A bearer-authenticated JSON client bound to one base URL.
///
/// The credential is fixed for the lifetime of a value. To call with a
/// different credential, derive a new value with [`RestClient::with_token`];
/// the connection pool is shared between the two.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    content_type: HeaderValue,
}

impl RestClient {
    /// Builds a client and its underlying connection pool.
    ///
    /// # Errors
    ///
    /// - [`RestError::ContentType`] if the `Content-Type` override is not a
    ///   valid header value.
    /// - [`RestError::Build`] if the TLS backend cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self, RestError> {
        let content_type = match config.content_type {
            Some(value) => HeaderValue::from_str(&value)
                .map_err(|source| RestError::ContentType { value, source })?,
            None => HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        };
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|source| RestError::Build { source })?;
        Ok(Self {
            http,
            base_url: config.base_url,
            token: config.token,
            content_type,
        })
    }

    /// Returns a copy of this client that authenticates with `token`.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..self.clone()
        }
    }

    /// Resolves `path` against the base URL.
    ///
    /// Absolute `http://` / `https://` URLs are used verbatim; anything else is
    /// appended to the base URL as-is.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Builds an absolute URL under the base URL from `segments` and `query`.
    ///
    /// Each segment and query pair is percent-encoded, so caller-supplied
    /// values cannot add path levels or query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidUrl`] if the base URL cannot be parsed or
    /// cannot carry a path.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<String, RestError> {
        let invalid = |reason: String| RestError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    /// Sends a request and returns the undecoded body of a 200/201 response.
    ///
    /// # Errors
    ///
    /// - [`RestError::Encode`] if `body` cannot be serialised.
    /// - [`RestError::Transport`] if the request cannot be sent or the body read.
    /// - [`RestError::Status`] for any status other than 200 or 201.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse, RestError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve_url(path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, self.content_type.clone());

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(|source| RestError::Encode {
                method: method.to_string(),
                url: url.clone(),
                source,
            })?;
            request = request.body(encoded);
        }

        let transport = |source| RestError::Transport {
            method: method.to_string(),
            url: url.clone(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let pagination = Pagination::from_headers(response.headers());
        let text = response.text().await.map_err(transport)?;

        debug!(%method, %url, status = status.as_u16(), "request completed");

        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(RestError::Status {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(RawResponse {
            url,
            status,
            pagination,
            body: text,
        })
    }

    /// Sends a request and decodes the 200/201 response body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`RestClient::send`] returns, plus [`RestError::Decode`].
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, RestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self.send(method, path, body).await?;
        Ok(ApiResponse {
            data: raw.json()?,
            status: raw.status,
            pagination: raw.pagination,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RestError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, RestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, RestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// PATCH is used against server-supplied callback URLs, so `path` is
    /// usually absolute.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, RestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
