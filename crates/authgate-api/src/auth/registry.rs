//! Refresh token registry
//!
//! Server-side storage for refresh tokens over the expiring key-value
//! backend. One slot per user under `token:{user_id}`: saving overwrites the
//! prior value unconditionally, which is the sole point enforcing the
//! single-active-refresh-token invariant.

use authgate_kv::{KeyValueStore, KvError};
use std::sync::Arc;
use tracing::warn;

/// Registry over the key-value backend
#[derive(Clone)]
pub struct RefreshTokenRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl RefreshTokenRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn token_key(user_id: &str) -> String {
        format!("token:{user_id}")
    }

    /// Store a user's refresh token, superseding any prior one
    ///
    /// Write failures propagate: the login flow treats a failed save as a
    /// failed login rather than returning a token that cannot be refreshed.
    pub async fn save(&self, user_id: &str, token: &str, ttl_secs: u64) -> Result<(), KvError> {
        self.store
            .set_ex(&Self::token_key(user_id), token, ttl_secs)
            .await
    }

    /// The currently stored token for a user, if any
    ///
    /// Read failures degrade to absent.
    pub async fn get(&self, user_id: &str) -> Option<String> {
        match self.store.get(&Self::token_key(user_id)).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Refresh token lookup failed for user {user_id}: {e}");
                None
            }
        }
    }

    /// Delete a user's refresh token slot
    ///
    /// Returns whether a token was present. Deleting an absent key is not an
    /// error.
    pub async fn delete(&self, user_id: &str) -> Result<bool, KvError> {
        self.store.delete(&Self::token_key(user_id)).await
    }

    /// Check a candidate token against the stored slot
    ///
    /// Exact string equality. Absent, mismatched, and unreachable-store cases
    /// are all `false`; the caller learns nothing about which one occurred.
    pub async fn verify(&self, user_id: &str, candidate: &str) -> bool {
        match self.get(user_id).await {
            Some(stored) => stored == candidate,
            None => false,
        }
    }
}
