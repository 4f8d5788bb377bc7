//! Request validator for inbound payloads
//!
//! Validation semantics:
//! - A required field is present when its key exists, whatever the value
//!   (an empty string still counts)
//! - Types are checked in schema declaration order; only the first
//!   mismatch is reported
//! - Payload keys the schema does not declare are collected as
//!   "unexpected" and only fail validation in strict mode
//! - `min_length` is measured in characters on string values
//!
//! The validator never mutates the payload.

use serde_json::{json, Map, Value};

use super::types::{SchemaDescriptor, TypeTag};
use crate::api::{ErrorSignal, SignalResult};

/// Outcome of a key or type check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub success: bool,
    /// Required names absent from the payload, in schema order
    pub missing_fields: Vec<String>,
    /// `(field, expected type)` for each mismatch, in schema order
    pub invalid_fields: Vec<(String, TypeTag)>,
    /// Payload keys the schema view does not declare
    pub unexpected_fields: Vec<String>,
}

/// Reports which required keys are absent from the payload.
pub fn check_required_keys(payload: &Map<String, Value>, required: &[&str]) -> ValidationResult {
    let missing_fields: Vec<String> = required
        .iter()
        .filter(|key| !payload.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    ValidationResult {
        success: missing_fields.is_empty(),
        missing_fields,
        ..Default::default()
    }
}

/// Checks the runtime type of each payload value the schema declares.
///
/// Fields absent from the payload are not reported here; that is the job
/// of [`check_required_keys`].
pub fn check_types(
    payload: &Map<String, Value>,
    expected: &[(&str, TypeTag)],
    strict: bool,
) -> ValidationResult {
    let invalid_fields: Vec<(String, TypeTag)> = expected
        .iter()
        .filter_map(|(name, tag)| {
            let value = payload.get(*name)?;
            (!tag.matches(value)).then(|| (name.to_string(), *tag))
        })
        .collect();

    let unexpected_fields: Vec<String> = payload
        .keys()
        .filter(|key| !expected.iter().any(|(name, _)| *name == key.as_str()))
        .cloned()
        .collect();

    let success = invalid_fields.is_empty() && (!strict || unexpected_fields.is_empty());

    ValidationResult {
        success,
        invalid_fields,
        unexpected_fields,
        ..Default::default()
    }
}

/// Applies the validation policy for one schema view.
pub struct RequestValidator<'a> {
    schema: &'a SchemaDescriptor,
    required_only: bool,
    strict: bool,
}

impl<'a> RequestValidator<'a> {
    /// Validator over the required-only view of `schema`
    pub fn new(schema: &'a SchemaDescriptor) -> Self {
        Self {
            schema,
            required_only: true,
            strict: false,
        }
    }

    /// Type-check optional fields as well
    pub fn all_fields(mut self) -> Self {
        self.required_only = false;
        self
    }

    /// Reject payload keys the schema view does not declare
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Runs key, type and length checks in that order.
    ///
    /// # Errors
    ///
    /// Returns a 400 `ErrorSignal` for the first failing stage:
    /// - missing required fields (all of them, comma-joined)
    /// - first type mismatch in schema order
    /// - unexpected fields (strict mode only)
    /// - first `min_length` violation
    pub fn validate(&self, payload: &Map<String, Value>) -> SignalResult<()> {
        let required = self.schema.required_field_names();
        let keys = check_required_keys(payload, &required);
        if !keys.success {
            let message = format!(
                "Missing required fields: ({})",
                keys.missing_fields.join(", ")
            );
            return Err(ErrorSignal::bad_request(message)
                .with_details(json!({ "missing_fields": keys.missing_fields })));
        }

        let expected = self.schema.expected_types(self.required_only);
        let types = check_types(payload, &expected, self.strict);
        if let Some((field, tag)) = types.invalid_fields.first() {
            let message = format!(
                "Invalid type at required field '{}' (expected: '{}')",
                field, tag
            );
            return Err(ErrorSignal::bad_request(message)
                .with_details(json!({ "field": field, "expected": tag.type_name() })));
        }
        if !types.success {
            let message = format!(
                "Unexpected fields: ({})",
                types.unexpected_fields.join(", ")
            );
            return Err(ErrorSignal::bad_request(message)
                .with_details(json!({ "unexpected_fields": types.unexpected_fields })));
        }

        self.check_lengths(payload)
    }

    fn check_lengths(&self, payload: &Map<String, Value>) -> SignalResult<()> {
        for field in &self.schema.fields {
            let Some(min_length) = field.min_length else {
                continue;
            };
            let Some(text) = payload.get(&field.name).and_then(Value::as_str) else {
                continue;
            };

            if text.chars().count() < min_length {
                let message = format!(
                    "{} must be at least {} characters long",
                    capitalize(&field.name),
                    min_length
                );
                return Err(ErrorSignal::bad_request(message)
                    .with_details(json!({ "field": field.name, "min_length": min_length })));
            }
        }

        Ok(())
    }
}

/// Upper-cases the first character of a field name for messages.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
