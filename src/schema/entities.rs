//! Static field tables for each entity the service accepts or stores
//!
//! Declared once at startup and handed to the validator; declaration order
//! is the order used in every validation message.

use super::types::{FieldDescriptor, SchemaDescriptor};

/// Minimum plaintext password length for registration
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Collection holding registered users
pub const USERS_COLLECTION: &str = "users";

/// Collection holding generated receipts
pub const RECEIPTS_COLLECTION: &str = "receipts";

/// Registration payload / stored user
pub fn user_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        USERS_COLLECTION,
        vec![
            FieldDescriptor::required_string("email"),
            FieldDescriptor::required_string("password").with_min_length(PASSWORD_MIN_LENGTH),
        ],
    )
}

/// Login payload (no length rule; a short password simply fails to verify)
pub fn login_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        "login",
        vec![
            FieldDescriptor::required_string("email"),
            FieldDescriptor::required_string("password"),
        ],
    )
}

/// Stored receipt document
pub fn receipt_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(
        RECEIPTS_COLLECTION,
        vec![
            FieldDescriptor::required_string("receipt_number"),
            FieldDescriptor::required_number("amount"),
            FieldDescriptor::optional_string("created_at"),
            FieldDescriptor::optional_string("updated_at"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeTag;

    #[test]
    fn test_user_schema_shape() {
        let schema = user_schema();
        assert_eq!(schema.required_field_names(), vec!["email", "password"]);
        assert_eq!(
            schema.field("password").unwrap().min_length,
            Some(PASSWORD_MIN_LENGTH)
        );
    }

    #[test]
    fn test_receipt_schema_required_view() {
        let schema = receipt_schema();
        assert_eq!(
            schema.expected_types(true),
            vec![("receipt_number", TypeTag::String), ("amount", TypeTag::Number)]
        );
    }
}
