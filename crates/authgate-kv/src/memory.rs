//! In-process key-value store
//!
//! Implements the store contract with a locked map and lazy expiry. Used by
//! tests and as the degraded-mode fallback when Redis is unreachable at
//! startup: refresh tokens then survive only for the process lifetime.

use crate::{KeyValueStore, KvError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Locked-map store with per-entry TTLs
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + std::time::Duration::from_secs(ttl_secs),
        };

        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        // Expired entries are removed on read rather than by a sweeper task
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }
}
