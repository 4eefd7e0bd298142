//! Error payload extraction
//!
//! Servers report failures either as a JSON body or as text that wraps a JSON
//! object somewhere inside it. Extraction is best-effort: when nothing usable
//! is found the caller gets an opaque rejection with a generic message.

use serde_json::{Deserializer, Map, Value};
use tracing::debug;

use crate::error::{AuthError, FieldErrors};

/// Message and field errors recovered from an error body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorPayload {
    pub message: Option<String>,
    pub fields: FieldErrors,
}

/// Recover a structured payload from an error body
pub fn extract_payload(body: &str) -> Option<ErrorPayload> {
    let object = parse_object(body.trim()).or_else(|| embedded_object(body))?;

    let message = ["message", "error"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    let fields = object
        .get("errors")
        .and_then(Value::as_object)
        .map(collect_fields)
        .unwrap_or_default();

    if message.is_none() && fields.is_empty() {
        return None;
    }

    Some(ErrorPayload { message, fields })
}

/// Turn a non-success response into the matching rejection error
pub fn rejection(status: u16, body: &str) -> AuthError {
    match extract_payload(body) {
        Some(payload) => AuthError::Rejected {
            status,
            message: payload
                .message
                .unwrap_or_else(|| generic_message(status)),
            fields: payload.fields,
        },
        None => {
            debug!("No structured payload in {} response", status);
            AuthError::RejectedOpaque {
                status,
                message: generic_message(status),
            }
        }
    }
}

/// Message used when the server gave nothing readable
pub fn generic_message(status: u16) -> String {
    match status {
        401 | 403 => "Invalid credentials".to_string(),
        422 => "The submitted data was invalid".to_string(),
        _ => format!("Request failed with status {}", status),
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// First JSON object embedded in `text`
///
/// Each `{` is tried as the start of a value; text around the object and
/// stray braces before it are skipped.
fn embedded_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        match Deserializer::from_str(&text[start..]).into_iter::<Value>().next() {
            Some(Ok(Value::Object(object))) => Some(object),
            _ => None,
        }
    })
}

fn collect_fields(errors: &Map<String, Value>) -> FieldErrors {
    errors
        .iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::String(message) => vec![message.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| (field.clone(), messages))
        })
        .collect()
}
