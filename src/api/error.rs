//! Unified error handling for backend API calls.
//!
//! Every request made by the client funnels its failure modes through
//! [`ApiError`] so callers can render one consistent message: the CLI bails
//! with it, the dashboard shows it as a transient notice. The backend
//! reports failures as a JSON body of the form `{"detail": "..."}`; that
//! message is extracted so the user sees the server's own wording.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials missing or rejected (HTTP 401).
    #[error("Authentication required. Log in with `dpdp-shield login` or check your session.")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never completed (connection refused, timeout, DNS).
    #[error("Failed to reach the DPDP Shield backend: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Failed to parse server response: {0}")]
    Decode(String),
}

/// Error body shape used by the backend for rejected requests.
#[derive(Debug, Deserialize)]
struct DetailBody {
    detail: String,
}

impl ApiError {
    /// Build an error from a non-success status and its raw body, pulling
    /// out the `detail` message when the body carries one.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        let message = serde_json::from_str::<DetailBody>(body)
            .map(|b| b.detail)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    format!("Server returned error {}", status)
                } else {
                    format!("Server returned error {}: {}", status, body.trim())
                }
            });
        ApiError::Server { status, message }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        ApiError::Decode(err.to_string())
    }

    /// True when re-authenticating could help.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_body_extracted() {
        let err = ApiError::from_response(400, r#"{"detail": "Breach already active"}"#);
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Breach already active");
            }
            other => panic!("expected Server error, got {:?}", other),
        }
    }

    #[test]
    fn test_401_maps_to_unauthorized() {
        let err = ApiError::from_response(401, r#"{"detail": "Invalid token"}"#);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Server returned error 502: Bad Gateway");
    }

    #[test]
    fn test_empty_body() {
        let err = ApiError::from_response(500, "");
        assert_eq!(err.to_string(), "Server returned error 500");
    }
}
