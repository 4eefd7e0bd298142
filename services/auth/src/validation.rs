//! Input validation utilities

use crate::error::{AuthError, FieldErrors};

/// Field name used for the login identifier
pub const IDENTIFIER_FIELD: &str = "identifier";

/// Field name used for the login secret
pub const SECRET_FIELD: &str = "secret";

/// Validate the login identifier (email or username)
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.trim().is_empty() {
        return Err("Identifier is required".to_string());
    }

    Ok(())
}

/// Validate the login secret
pub fn validate_secret(secret: &str) -> Result<(), String> {
    if secret.trim().is_empty() {
        return Err("Secret is required".to_string());
    }

    Ok(())
}

/// Validate both credentials, collecting every field error
pub fn validate_credentials(identifier: &str, secret: &str) -> Result<(), AuthError> {
    let mut fields = FieldErrors::new();

    if let Err(message) = validate_identifier(identifier) {
        fields.insert(IDENTIFIER_FIELD.to_string(), vec![message]);
    }

    if let Err(message) = validate_secret(secret) {
        fields.insert(SECRET_FIELD.to_string(), vec![message]);
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(fields))
    }
}
