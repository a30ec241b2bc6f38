//! Credential store
//!
//! In-memory user storage behind a single lock. Uniqueness checks and the
//! insert run under one write-lock acquisition so two concurrent
//! registrations cannot both pass the duplicate check. Username lookup is a
//! linear scan, accepted at this scale; an indexed store would be required
//! beyond it.

use super::models::User;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Credential store errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,
}

/// In-memory user store keyed by user id
#[derive(Default)]
pub struct CredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user, enforcing username and email uniqueness
    ///
    /// The duplicate checks and the write happen under one lock; this is the
    /// compare-and-insert the registration flow relies on.
    pub async fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::DuplicateUsername);
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    /// Whether a username is already taken
    pub async fn username_taken(&self, username: &str) -> bool {
        self.users
            .read()
            .await
            .values()
            .any(|u| u.username == username)
    }

    /// Whether an email is already registered
    pub async fn email_taken(&self, email: &str) -> bool {
        self.users.read().await.values().any(|u| u.email == email)
    }

    /// Find a user by login name
    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    /// Find a user by id
    pub async fn find_by_id(&self, user_id: &str) -> Option<User> {
        self.users.read().await.get(user_id).cloned()
    }

    /// Record a successful login
    pub async fn record_login(
        &self,
        user_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or(RepositoryError::UserNotFound)?;
        user.last_login = Some(timestamp);
        Ok(())
    }

    /// All users, for the admin listing
    pub async fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        users
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}
