//! Schema descriptors and request validation
//!
//! # Design Principles
//!
//! - One static, ordered field table per entity
//! - Presence is key membership, never truthiness
//! - Types are checked in declaration order; first mismatch wins
//! - No coercion: the validator never rewrites a payload
//! - Failures come back as `ErrorSignal`s for the response boundary

mod entities;
mod formats;
mod types;
mod validator;

pub use entities::{
    login_schema, receipt_schema, user_schema, PASSWORD_MIN_LENGTH, RECEIPTS_COLLECTION,
    USERS_COLLECTION,
};
pub use formats::is_valid_email;
pub use types::{FieldDescriptor, SchemaDescriptor, TypeTag};
pub use validator::{check_required_keys, check_types, RequestValidator, ValidationResult};
