//! Normalized gateway errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// What went wrong with a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The request never produced a response (DNS, connect, timeout...).
    Transport,
    /// The backend answered with a non-2xx status or `success: false`.
    Rejected { status: u16 },
    /// The backend answered 401; stored tokens have been cleared.
    Unauthorized,
    /// The response body did not match the expected shape.
    Decode,
    /// The operation has no client-side implementation.
    Unsupported,
}

/// A failed gateway call.
///
/// Every transport, HTTP and envelope failure is folded into this one shape
/// so callers never inspect `reqwest` errors directly.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    /// Backend or client supplied description.
    pub message: String,
    /// Underlying detail, when there is one.
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl GatewayError {
    fn new(kind: GatewayErrorKind, message: impl Into<String>, cause: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn transport(error: &reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out"
        } else if error.is_connect() {
            "could not connect to server"
        } else {
            "request failed"
        };
        Self::new(GatewayErrorKind::Transport, message, Some(error.to_string()))
    }

    pub(crate) fn rejected(status: u16, message: impl Into<String>, cause: Option<String>) -> Self {
        Self::new(GatewayErrorKind::Rejected { status }, message, cause)
    }

    pub(crate) fn unauthorized(reason: Option<String>, cause: Option<String>) -> Self {
        Self::new(
            GatewayErrorKind::Unauthorized,
            reason.unwrap_or_else(|| "authentication required".to_string()),
            cause,
        )
    }

    pub(crate) fn decode(error: &serde_json::Error) -> Self {
        Self::new(
            GatewayErrorKind::Decode,
            "unexpected response format",
            Some(error.to_string()),
        )
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unsupported, message, None)
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Unauthorized)
    }

    /// HTTP status for rejected requests.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            GatewayErrorKind::Rejected { status } => Some(status),
            _ => None,
        }
    }

    /// Text suitable for showing inline next to a form or table.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            GatewayErrorKind::Transport => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            GatewayErrorKind::Unauthorized => {
                "Your session has expired. Please log in again.".to_string()
            }
            GatewayErrorKind::Decode => "The server sent an unexpected response.".to_string(),
            GatewayErrorKind::Rejected { status } if status >= 500 => {
                "The server is having trouble. Please try again shortly.".to_string()
            }
            GatewayErrorKind::Rejected { .. } | GatewayErrorKind::Unsupported => {
                self.message.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_backend_text_through() {
        let err = GatewayError::rejected(400, "Seat is inactive", None);
        assert_eq!(err.user_message(), "Seat is inactive");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Seat is inactive");
    }

    #[test]
    fn test_user_message_hides_server_errors() {
        let err = GatewayError::rejected(502, "upstream exploded", Some("trace".into()));
        assert!(!err.user_message().contains("exploded"));
    }

    #[test]
    fn test_unauthorized() {
        let err = GatewayError::unauthorized(None, None);
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), None);
        assert_eq!(err.message, "authentication required");
        assert!(err.user_message().contains("log in"));
    }

    #[test]
    fn test_unauthorized_keeps_backend_reason() {
        let err =
            GatewayError::unauthorized(Some("Token expired".into()), Some("JWT_EXPIRED".into()));
        assert_eq!(err.message, "Token expired");
        assert_eq!(err.cause.as_deref(), Some("JWT_EXPIRED"));
        assert_eq!(err.user_message(), "Your session has expired. Please log in again.");
    }

    #[test]
    fn test_anonymous_401_shows_backend_text() {
        let err = GatewayError::rejected(401, "Invalid email or password", None);
        assert!(!err.is_unauthorized());
        assert_eq!(err.user_message(), "Invalid email or password");
    }
}
