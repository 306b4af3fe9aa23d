//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`ProjectId`] with a [`WorkspaceId`] even though both are strings under the
//! hood.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when an identifier is built from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// TryFrom<String> that serde uses so decoding enforces the same rule as new().
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: assigned by the run service
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a run-service workspace (e.g. `"ws-abc123"`).
    ///
    /// Workspace variables, including the governance project key, are read
    /// per workspace.
    WorkspaceId
}

string_id! {
    /// Identifies a single infrastructure-provisioning run (e.g. `"run-xyz789"`).
    RunId
}

string_id! {
    /// The absolute URL the run service expects the verdict to be PATCHed to.
    ///
    /// Supplied per run in the task payload; it is never relative to a
    /// configured base URL.
    CallbackUrl
}

// ---------------------------------------------------------------------------
// Identifiers: assigned by the governance service
// ---------------------------------------------------------------------------

string_id! {
    /// The governance-service project key.
    ///
    /// Resolved from the `CLOUDTAMERIO_PROJECT` workspace variable; once
    /// resolved it addresses every governance query of that invocation.
    ProjectId
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A run-scoped bearer token taken from the task payload.
///
/// The callback endpoint authorises against this token rather than the
/// relay's service credential. `Debug` output is redacted so the token never
/// reaches the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one handling of one inbound webhook call.
///
/// Generated fresh for every accepted payload and attached to the workflow
/// span so all activity from a single invocation can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
