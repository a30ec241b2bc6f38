//! Redis-backed key-value store
//!
//! Production implementation of the store contract over a single multiplexed
//! async connection shared behind a lock.

use crate::{KeyValueStore, KvError};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Redis connection wrapper
#[derive(Clone)]
pub struct RedisStore {
    connection: Arc<RwLock<MultiplexedConnection>>,
}

impl RedisStore {
    /// Connect to Redis and verify the connection with a PING
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| KvError::ConnectionError(e.to_string()))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| KvError::ConnectionError(e.to_string()))?;

        let store = Self {
            connection: Arc::new(RwLock::new(connection)),
        };
        store.ping().await?;

        info!("Redis connection established");
        Ok(store)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        let mut conn = self.connection.write().await;
        let _: () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .map_err(|e| KvError::CommandError(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| KvError::CommandError(e.to_string()))?;

        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.connection.write().await;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| KvError::CommandError(e.to_string()))?;

        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<(), KvError> {
        let mut conn = self.connection.write().await;
        let result: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| KvError::CommandError(e.to_string()))?;

        if result == "PONG" {
            Ok(())
        } else {
            Err(KvError::CommandError(format!(
                "unexpected PING reply: {result}"
            )))
        }
    }
}
