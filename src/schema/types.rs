//! Schema type definitions
//!
//! Supported types:
//! - String: UTF-8 string
//! - Number: any JSON number
//! - Boolean: true / false
//! - Object: nested JSON object
//! - Array: JSON array
//!
//! Descriptors are declared statically per entity and never change after
//! construction. Field order is the declaration order and drives the order
//! of every validation report.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Symbolic identifier for an expected runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// UTF-8 string
    String,
    /// Any JSON number (integer or float)
    Number,
    /// Boolean
    Boolean,
    /// Nested JSON object
    Object,
    /// JSON array
    Array,
}

impl TypeTag {
    /// Returns the type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Object => "Object",
            TypeTag::Array => "Array",
        }
    }

    /// Parses a declared type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(TypeTag::String),
            "number" => Some(TypeTag::Number),
            "boolean" | "bool" => Some(TypeTag::Boolean),
            "object" => Some(TypeTag::Object),
            "array" => Some(TypeTag::Array),
            _ => None,
        }
    }

    /// Whether a JSON value has this runtime type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::String => value.is_string(),
            TypeTag::Number => value.is_number(),
            TypeTag::Boolean => value.is_boolean(),
            TypeTag::Object => value.is_object(),
            TypeTag::Array => value.is_array(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Static metadata about one entity field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as it appears in payloads and documents
    pub name: String,
    /// Whether the field must be present
    pub required: bool,
    /// Declared runtime type
    pub expected_type: TypeTag,
    /// Minimum length in characters (string fields only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

impl FieldDescriptor {
    /// Create a required string field
    pub fn required_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            expected_type: TypeTag::String,
            min_length: None,
        }
    }

    /// Create an optional string field
    pub fn optional_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            expected_type: TypeTag::String,
            min_length: None,
        }
    }

    /// Create a required number field
    pub fn required_number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            expected_type: TypeTag::Number,
            min_length: None,
        }
    }

    /// Create an optional number field
    pub fn optional_number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            expected_type: TypeTag::Number,
            min_length: None,
        }
    }

    /// Create a required boolean field
    pub fn required_boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            expected_type: TypeTag::Boolean,
            min_length: None,
        }
    }

    /// Attach a minimum character length
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }
}

/// Ordered field table for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Entity name (collection name for stored entities)
    pub entity: String,
    /// Field descriptors in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Create a new descriptor
    pub fn new(entity: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            entity: entity.into(),
            fields,
        }
    }

    /// Builds a descriptor from a JSON model definition.
    ///
    /// Expected shape: `{"<field>": {"type": "String", "required": true, "minlength": 6}}`.
    /// An absent or structurally malformed definition yields an empty
    /// descriptor rather than an error. Individual fields without a
    /// recognised `type` are skipped.
    pub fn from_definition(entity: impl Into<String>, definition: Option<&Value>) -> Self {
        let entity = entity.into();
        let Some(object) = definition.and_then(Value::as_object) else {
            return Self::new(entity, Vec::new());
        };

        let fields = object
            .iter()
            .filter_map(|(name, attributes)| {
                let attributes = attributes.as_object()?;
                let expected_type = attributes
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(TypeTag::from_name)?;
                let required = attributes
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let min_length = attributes
                    .get("minlength")
                    .or_else(|| attributes.get("min_length"))
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok());

                Some(FieldDescriptor {
                    name: name.clone(),
                    required,
                    expected_type,
                    min_length,
                })
            })
            .collect();

        Self::new(entity, fields)
    }

    /// True when no fields are declared ("no schema available")
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field descriptor by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of required fields, in declaration order
    pub fn required_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Field name to expected type, in declaration order
    pub fn expected_types(&self, required_only: bool) -> Vec<(&str, TypeTag)> {
        self.fields
            .iter()
            .filter(|f| !required_only || f.required)
            .map(|f| (f.name.as_str(), f.expected_type))
            .collect()
    }
}
