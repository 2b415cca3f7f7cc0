//! Wire DTOs for the auth boundary.
//!
//! DESIGN
//! ======
//! These types mirror the backend's JSON bodies for `/auth/login`,
//! `/auth/me` and the collaborator record. Identifiers arrive as numbers from
//! some deployments and as strings from others, so they are normalized to
//! `String` on the way in.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Coarse-grained permission class. Selects a whole menu configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Collaborator,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal as issued by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend identifier, normalized to a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Permission class.
    pub role: Role,
}

/// City a collaborator works in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// State/province abbreviation.
    pub state: String,
}

/// Staff record attached to a session when the user works as a collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub city_id: String,
    /// Monthly revenue target.
    pub revenue_goal: f64,
    /// Monthly consultation target.
    pub consultation_goal: u32,
    pub is_active: bool,
    pub user: User,
    pub city: City,
}

/// Body of a successful `/auth/login` or `/auth/me` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user: User,
    #[serde(default)]
    pub collaborator: Option<Collaborator>,
}

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Accept either a JSON string or an integral number as an identifier.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Ok(id),
        serde_json::Value::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(int), _) => Ok(int.to_string()),
            (None, Some(uint)) => Ok(uint.to_string()),
            _ => Err(D::Error::custom("expected integer identifier")),
        },
        _ => Err(D::Error::custom("expected non-empty string or integer identifier")),
    }
}
