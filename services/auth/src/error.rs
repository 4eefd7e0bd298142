//! Custom error types for the session client

use std::collections::BTreeMap;

use common::StorageError;
use thiserror::Error;

/// Field name to user-facing messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Custom error type for session store operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Input rejected locally, before any network call
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(FieldErrors),

    /// Request did not complete
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server refused the request with a readable payload
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
        fields: FieldErrors,
    },

    /// Server refused the request and nothing could be extracted
    #[error("Request rejected with status {status}: {message}")]
    RejectedOpaque { status: u16, message: String },

    /// Success status, but the body matched no known schema
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Backing store read or write failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Refresh requested without any session
    #[error("No session to refresh")]
    NoSession,
}

impl AuthError {
    /// Field-level messages, when the error carries any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AuthError::Validation(fields) => Some(fields),
            AuthError::Rejected { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    /// General message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(fields) => join_field_errors(fields),
            AuthError::Rejected { message, .. } | AuthError::RejectedOpaque { message, .. } => {
                message.clone()
            }
            AuthError::Network(_) => "Unable to reach the server".to_string(),
            AuthError::Decode(_) => "The server sent an unexpected response".to_string(),
            AuthError::Storage(_) => "Unable to save the session on this device".to_string(),
            AuthError::NoSession => "You are not signed in".to_string(),
        }
    }
}

fn join_field_errors(fields: &FieldErrors) -> String {
    fields
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join("; ")
}

/// Type alias for session client results
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let mut fields = FieldErrors::new();
        fields.insert("identifier".to_string(), vec!["Identifier is required".to_string()]);
        fields.insert("secret".to_string(), vec!["Secret is required".to_string()]);

        let err = AuthError::Validation(fields);
        assert_eq!(
            err.user_message(),
            "Identifier is required; Secret is required"
        );
        assert_eq!(err.field_errors().map(|f| f.len()), Some(2));
        assert!(err.to_string().starts_with("Validation failed"));
    }

    #[test]
    fn test_rejected_without_fields_has_no_field_errors() {
        let err = AuthError::Rejected {
            status: 401,
            message: "Invalid credentials".to_string(),
            fields: FieldErrors::new(),
        };
        assert!(err.field_errors().is_none());
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
