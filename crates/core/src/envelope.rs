//! The backend's uniform response envelope.
//!
//! Every REST response, success or failure, is wrapped as
//! `{success, message, data?, error?, timestamp}`. Clients branch on
//! `success`, never on HTTP status text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::timestamp_option;

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the backend accepted the request.
    pub success: bool,
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// Payload, absent for commands without a result.
    #[serde(default)]
    pub data: Option<T>,
    /// Error detail when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Server time at which the response was produced.
    #[serde(default, with = "timestamp_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl<T> ApiResponse<T> {
    /// Build a successful envelope.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Build a failed envelope.
    #[must_use]
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            timestamp: Some(Utc::now()),
        }
    }

    /// The most specific description of a failure: `error` if present and
    /// non-empty, else `message`, else a generic fallback.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| Some(self.message.as_str()).filter(|m| !m.trim().is_empty()))
            .unwrap_or("request was rejected")
            .to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_success_with_data() {
        let json = r#"{
            "success": true,
            "message": "ok",
            "data": {"count": 3},
            "timestamp": "2024-05-01T10:00:00"
        }"#;
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()["count"], 3);
        assert!(envelope.timestamp.is_some());
    }

    #[test]
    fn test_deserialize_without_data() {
        let json = r#"{"success": true, "message": "deleted"}"#;
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.timestamp.is_none());
    }

    #[test]
    fn test_failure_reason_prefers_error() {
        let envelope: ApiResponse<()> = ApiResponse::failure("Bad request", "Seat not found");
        assert_eq!(envelope.failure_reason(), "Seat not found");

        let envelope: ApiResponse<()> = ApiResponse::failure("Bad request", "  ");
        assert_eq!(envelope.failure_reason(), "Bad request");

        let envelope: ApiResponse<()> = ApiResponse::failure("", "");
        assert_eq!(envelope.failure_reason(), "request was rejected");
    }
}
