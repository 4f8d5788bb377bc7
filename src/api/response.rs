//! Error response boundary
//!
//! The JSON error envelope and the single place that writes it. Every
//! `ErrorSignal` that reaches axum is rendered here; handlers and
//! extractors never build error bodies themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::errors::ErrorSignal;

/// Inner error object of the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// `"<code> (<reason>)"`, or `"<code>"` when the code has no known reason
    pub status_code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Uniform error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    /// Build the envelope for a signal
    pub fn from_signal(signal: &ErrorSignal) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                status_code: status_label(signal.effective_status_code()),
                message: signal.message().to_string(),
                details: signal.details().cloned(),
            },
        }
    }
}

/// Formats a status code with its canonical reason phrase when one exists
pub fn status_label(code: u16) -> String {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());

    match reason {
        Some(reason) => format!("{} ({})", code, reason),
        None => code.to_string(),
    }
}

impl IntoResponse for ErrorSignal {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.effective_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(status = status.as_u16(), message = %self.message(), "request failed");
        } else {
            warn!(status = status.as_u16(), message = %self.message(), "request rejected");
        }

        // Json sets `content-type: application/json`
        (status, Json(ErrorEnvelope::from_signal(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::json;

    #[test]
    fn test_status_label_known_code() {
        assert_eq!(status_label(409), "409 (Conflict)");
        assert_eq!(status_label(500), "500 (Internal Server Error)");
    }

    #[test]
    fn test_status_label_unknown_code() {
        assert_eq!(status_label(599), "599");
        assert_eq!(status_label(470), "470");
    }

    #[test]
    fn test_envelope_shape() {
        let signal = ErrorSignal::bad_request("Missing required fields: (email)");
        let value = serde_json::to_value(ErrorEnvelope::from_signal(&signal)).unwrap();

        assert_eq!(
            value,
            json!({
                "success": false,
                "error": {
                    "status_code": "400 (Bad Request)",
                    "message": "Missing required fields: (email)"
                }
            })
        );
    }

    #[test]
    fn test_envelope_keeps_details() {
        let signal = ErrorSignal::conflict("taken").with_details(json!({ "field": "email" }));
        let envelope = ErrorEnvelope::from_signal(&signal);
        assert_eq!(envelope.error.details, Some(json!({ "field": "email" })));
    }

    #[test]
    fn test_unknown_status_omits_reason_and_details() {
        let signal = ErrorSignal::new(599, "odd");
        let value = serde_json::to_value(ErrorEnvelope::from_signal(&signal)).unwrap();

        assert_eq!(value["error"]["status_code"], "599");
        assert!(value["error"].get("details").is_none());
    }

    #[test]
    fn test_out_of_range_status_renders_500() {
        let response = ErrorSignal::new(1234, "weird").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_sets_json_content_type() {
        let response = ErrorSignal::not_found("nope").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
