use runtask::ServiceError;
use thiserror::Error;

/// Errors produced by [`crate::RestClient`].
///
/// Status and decode failures are distinct variants so callers can tell a
/// rejected request from a response of the wrong shape.
#[derive(Debug, Error)]
pub enum RestError {
    /// The underlying HTTP client could not be constructed.
    #[error("could not build HTTP client: {source}")]
    Build {
        #[source]
        source: reqwest::Error,
    },

    /// The configured `Content-Type` override is not a valid header value.
    #[error("invalid content type '{value}': {source}")]
    ContentType {
        value: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    /// A request URL could not be built from the base URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request body could not be serialised to JSON.
    #[error("could not encode request body for {method} {url}: {source}")]
    Encode {
        method: String,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be sent or the response body could not be read.
    #[error("request failed: method: {method}, url: {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status other than 200 or 201.
    #[error("url: {url}, method: {method}, status: {status}, body: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The server answered successfully but the body did not decode into the
    /// requested type.
    #[error("could not unmarshal response body from {url}: {body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<RestError> for ServiceError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Build { source } => ServiceError::Transport {
                method: String::new(),
                url: String::new(),
                message: source.to_string(),
            },
            RestError::ContentType { value, source } => ServiceError::Transport {
                method: String::new(),
                url: String::new(),
                message: format!("invalid content type '{value}': {source}"),
            },
            RestError::InvalidUrl { url, reason } => ServiceError::Transport {
                method: String::new(),
                url,
                message: reason,
            },
            RestError::Encode { source, .. } => ServiceError::Encode {
                message: source.to_string(),
            },
            RestError::Transport {
                method,
                url,
                source,
            } => ServiceError::Transport {
                method,
                url,
                message: source.to_string(),
            },
            RestError::Status {
                method,
                url,
                status,
                body,
            } => ServiceError::Status {
                method,
                url,
                status,
                body,
            },
            RestError::Decode { url, body, .. } => ServiceError::Decode { url, body },
        }
    }
}
