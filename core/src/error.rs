//! Error types for the FirstPromoter client.
//!
//! # Design
//! Local failures (`Serialization`, `InvalidInput`, `MissingEnv`) are kept
//! apart from failures of the round-trip (`Transport`) and from failures to
//! understand a response (`Status`, `Decode`, `Timestamp`). Every variant
//! keeps its underlying cause so callers can decide whether to retry.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request payload could not be serialized to JSON.
    #[error("marshal signup request: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The HTTP round-trip did not produce a response.
    #[error("send signup request: {0}")]
    Transport(#[from] TransportError),

    /// The server answered outside 2xx. `body` holds at most 8 KiB.
    #[error("signup: unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A 2xx body was present but was not the expected JSON.
    #[error("decode signup response: {0}")]
    Decode(#[source] serde_json::Error),

    /// `created_at` in a 2xx body was not RFC 3339.
    #[error("parse created_at {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Returned by [`TrackSignUpInput::validate`](crate::TrackSignUpInput::validate).
    #[error("invalid signup input: {0}")]
    InvalidInput(&'static str),

    /// A required environment variable was not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

impl Error {
    /// HTTP status of a non-2xx response, if that is what this error is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures raised before a response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The supplied [`Context`](crate::Context) was cancelled or expired.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The underlying HTTP client failed (DNS, connect, TLS, timeout, ...).
    #[error("{0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a [`Context`](crate::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_carries_code_reason_and_body() {
        let err = Error::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: r#"{"error":"invalid ref_id"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"signup: unexpected status 422 Unprocessable Entity: {"error":"invalid ref_id"}"#
        );
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn context_errors_are_transparent_through_transport() {
        let err = Error::from(TransportError::from(ContextError::DeadlineExceeded));
        assert_eq!(
            err.to_string(),
            "send signup request: context deadline exceeded"
        );
        assert!(err.status().is_none());
    }
}
