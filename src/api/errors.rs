//! Error signal carried from any component to the response boundary
//!
//! An `ErrorSignal` names the HTTP status to answer with, a user-safe
//! message and optional structured details. Components return it through
//! `Result` and `?`; only the responder in `response.rs` renders it.

use std::fmt;

use serde_json::Value;

/// Message used when a failure has no more specific description
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred, please try again later";

/// Status code used when none was given or the given one is out of range
pub const DEFAULT_STATUS_CODE: u16 = 500;

/// In-flight failure: status code, message and optional details
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSignal {
    status_code: u16,
    message: String,
    details: Option<Value>,
}

impl ErrorSignal {
    /// Create a signal with an explicit status code and message
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            details: None,
        }
    }

    /// 400 - request failed validation
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// 401 - credentials missing or wrong
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    /// 404 - no such resource or route
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// 409 - unique value already taken
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    /// 500 with the generic user-safe message
    pub fn unexpected() -> Self {
        Self::default()
    }

    /// Attach structured details
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Status code as raised (may be outside the HTTP range)
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Status code the responder will answer with
    pub fn effective_status_code(&self) -> u16 {
        if (100..=599).contains(&self.status_code) {
            self.status_code
        } else {
            DEFAULT_STATUS_CODE
        }
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured details, if any
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Whether the failure is the caller's fault (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.effective_status_code())
    }
}

impl Default for ErrorSignal {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_CODE, DEFAULT_ERROR_MESSAGE)
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status_code, self.message)
    }
}

impl std::error::Error for ErrorSignal {}

/// Result type for request handling
pub type SignalResult<T> = Result<T, ErrorSignal>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_signal() {
        let signal = ErrorSignal::default();
        assert_eq!(signal.status_code(), 500);
        assert_eq!(signal.message(), DEFAULT_ERROR_MESSAGE);
        assert!(signal.details().is_none());
        assert_eq!(signal, ErrorSignal::unexpected());
    }

    #[test]
    fn test_constructors_set_status() {
        assert_eq!(ErrorSignal::bad_request("x").status_code(), 400);
        assert_eq!(ErrorSignal::unauthorized("x").status_code(), 401);
        assert_eq!(ErrorSignal::not_found("x").status_code(), 404);
        assert_eq!(ErrorSignal::conflict("x").status_code(), 409);
    }

    #[test]
    fn test_out_of_range_status_falls_back() {
        assert_eq!(ErrorSignal::new(42, "x").effective_status_code(), 500);
        assert_eq!(ErrorSignal::new(600, "x").effective_status_code(), 500);
        assert_eq!(ErrorSignal::new(599, "x").effective_status_code(), 599);
    }

    #[test]
    fn test_details_attach() {
        let signal = ErrorSignal::bad_request("bad").with_details(json!({ "field": "email" }));
        assert_eq!(signal.details(), Some(&json!({ "field": "email" })));
        assert!(signal.is_client_error());
    }
}
