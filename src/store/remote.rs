//! RemoteStore - Redis over a multiplexed async connection.

use super::KeyValueStore;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

pub struct RemoteStore {
    conn: MultiplexedConnection,
}

impl RemoteStore {
    /// One connection attempt, bounded by `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| WalletError::Config(format!("Redis url: {}", e)))?;
        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| WalletError::read(format!("Redis connect timed out after {:?}", timeout)))?
            .map_err(|e| WalletError::read(format!("Redis connect: {}", e)))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RemoteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| WalletError::read(format!("Redis GET {}: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| WalletError::write(format!("Redis SET {}: {}", key, e)))
    }
}
