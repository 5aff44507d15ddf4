//! # Client Error Types

use thiserror::Error;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the HTTP clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure, timeout, or an unparseable response body.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    /// Create an API error from an HTTP response status and body.
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure is worth retrying. Connection-level trouble and
    /// server-side (5xx) refusals are; 4xx rejections are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_timeout() || err.is_connect(),
            ClientError::Api { status, .. } => *status >= 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_constructor() {
        let err = ClientError::api_error(404, "no such task");
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such task");
            }
            _ => panic!("expected Api variant"),
        }
    }

    #[test]
    fn server_errors_are_recoverable() {
        assert!(ClientError::api_error(500, "at capacity").is_recoverable());
        assert!(ClientError::api_error(503, "unavailable").is_recoverable());
    }

    #[test]
    fn client_errors_are_not_recoverable() {
        assert!(!ClientError::api_error(400, "bad params").is_recoverable());
        assert!(!ClientError::api_error(404, "not found").is_recoverable());
    }

    #[test]
    fn display_format() {
        let err = ClientError::api_error(500, "task limit reached");
        assert_eq!(format!("{err}"), "API error: 500 - task limit reached");
    }
}
