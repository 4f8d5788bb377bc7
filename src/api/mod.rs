//! Error boundary for the HTTP surface
//!
//! - `ErrorSignal`: status code + message + optional details, raised by any component
//! - `ErrorEnvelope`: the one JSON shape every error response uses
//!
//! Rendering happens only in `IntoResponse for ErrorSignal`.

mod errors;
mod response;

pub use errors::{ErrorSignal, SignalResult, DEFAULT_ERROR_MESSAGE, DEFAULT_STATUS_CODE};
pub use response::{status_label, ErrorBody, ErrorEnvelope};
