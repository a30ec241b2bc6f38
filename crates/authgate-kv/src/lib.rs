//! Authgate KV - Expiring key-value backend abstraction
//!
//! Defines the minimal store contract the token registry depends on
//! (SET with TTL, GET, DEL, plus a liveness probe) and two implementations:
//! - `RedisStore`: production backend over a multiplexed async connection
//! - `MemoryStore`: in-process fallback used in tests and when Redis is
//!   unreachable at startup

pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

/// Key-value backend errors
#[derive(Debug, Error)]
pub enum KvError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Command error: {0}")]
    CommandError(String),
}

/// Expiring key-value store contract
///
/// Every value is written with a TTL; the backend owns expiry. Implementations
/// must be safe to share across concurrent requests.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Set a key to a value with a TTL in seconds, overwriting any prior value
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError>;

    /// Get the value for a key, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Delete a key, returning whether a key was removed
    async fn delete(&self, key: &str) -> Result<bool, KvError>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), KvError>;
}
