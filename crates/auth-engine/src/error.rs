//! Authentication error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Authentication error type.
///
/// Every failure in the subsystem is normalized into one of these
/// variants; the Display output is the human-readable detail surfaced to
/// the session state stream, most specific first: backend-supplied
/// detail, then transport description, then a generic fallback.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Backend rejected the request; detail preserved verbatim
    #[error("{0}")]
    Validation(String),

    /// Token fields missing/empty or an unrecognized response shape
    #[error("{0}")]
    MalformedResponse(String),

    /// Connectivity or timeout failure
    #[error("{0}")]
    Network(String),

    /// Secure store unavailable or write failure
    #[error("secure storage error: {0}")]
    Storage(#[from] artel_storage::StorageError),

    /// Session query with no stored token
    #[error("not logged in")]
    SessionAbsent,
}

impl From<reqwest::Error> for AuthError {
    /// Strip transport-layer wrapping down to a short description.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Network("request timed out".to_string())
        } else if err.is_connect() {
            AuthError::Network("could not reach the server".to_string())
        } else if err.is_decode() {
            AuthError::MalformedResponse("server returned an unreadable response".to_string())
        } else {
            AuthError::Network("request failed".to_string())
        }
    }
}

impl AuthError {
    /// Build a validation error from a 4xx response body.
    ///
    /// The backend answers either `{"detail": "..."}` or a field-error map
    /// like `{"bin": ["already exists"]}`; both are flattened into the
    /// backend's own wording. Anything unparseable falls back to the
    /// status code.
    pub(crate) fn from_rejection(status: StatusCode, body: &str) -> AuthError {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
                return AuthError::Validation(detail.to_string());
            }

            if let Some(fields) = value.as_object() {
                let mut parts = Vec::new();
                for (field, errors) in fields {
                    match errors {
                        serde_json::Value::String(message) => {
                            parts.push(format!("{}: {}", field, message));
                        }
                        serde_json::Value::Array(messages) => {
                            for message in messages.iter().filter_map(|m| m.as_str()) {
                                parts.push(format!("{}: {}", field, message));
                            }
                        }
                        _ => {}
                    }
                }
                if !parts.is_empty() {
                    return AuthError::Validation(parts.join("; "));
                }
            }
        }

        AuthError::Validation(format!("request rejected (HTTP {})", status.as_u16()))
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
