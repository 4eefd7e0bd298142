//! User profile model and related functionality

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// User profile as returned by the auth API
///
/// Servers disagree on the types of the descriptive fields (`active` may be a
/// number, `profile` an object), so each is accepted as any JSON value and
/// kept in string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub active: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub profile: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email_verified_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

impl User {
    /// A profile carrying only an id
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            uuid: None,
            name: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            avatar: None,
            avatar_url: None,
            role: None,
            active: None,
            profile: None,
            email_verified_at: None,
            created_at: None,
        }
    }

    /// Name shown to the user, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown")
    }

    /// Whether the server has recorded an email verification
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Read an optional value of any JSON type as a string
///
/// Strings are taken as-is, null as absent, everything else as its JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value),
        Some(other) => Some(other.to_string()),
    })
}
