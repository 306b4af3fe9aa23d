//! Typed JSON REST client.
//!
//! [`RestClient`] issues bearer-authenticated HTTP requests against a base URL,
//! serialises request bodies to JSON, decodes response bodies into
//! caller-chosen types, and extracts [`Pagination`] metadata from response
//! headers. The `governance` and `run-service` crates each wrap one instance.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, URL resolution, header injection, and
//! status classification live here. [`RestError`] converts into
//! [`runtask::ServiceError`] so the orchestration layer never sees `reqwest`
//! types.
//!
//! ## Status handling
//!
//! Only `200 OK` and `201 Created` count as success. Every other status is a
//! [`RestError::Status`] carrying the method, resolved URL, status code, and
//! raw body; no decode is attempted and nothing is retried.

mod client;
mod error;
mod pagination;

pub use client::{ApiResponse, ClientConfig, RawResponse, RestClient, DEFAULT_CONTENT_TYPE};
pub use error::RestError;
pub use pagination::Pagination;

// Re-exported so adapters can name methods without depending on reqwest directly.
pub use reqwest::Method;
