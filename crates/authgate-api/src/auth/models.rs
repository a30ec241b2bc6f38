//! Data models for authentication
//!
//! Defines the user identity record owned by the credential store and its
//! public projection returned by API responses.

use authgate_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User identity record
///
/// Owned exclusively by the credential store. Created at registration,
/// `last_login` mutated on successful authentication, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique user identifier
    pub id: String,

    /// Login name (unique)
    pub username: String,

    /// Hashed password (Argon2id PHC string)
    /// This field is never serialized in API responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Email address (unique)
    pub email: String,

    /// Display name (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Role
    pub role: Role,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last successful login timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user with a freshly generated id
    ///
    /// # Arguments
    ///
    /// * `username` - Login name
    /// * `password_hash` - Hashed password (use `password::hash_password`)
    /// * `email` - Email address
    /// * `full_name` - Display name (optional)
    /// * `role` - Role
    pub fn new(
        username: String,
        password_hash: String,
        email: String,
        full_name: Option<String>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            email,
            full_name,
            role,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    /// Convert to the public representation (without the password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}
