//! Redis tariff store for the charging function
//!
//! Implements the `TariffStore` trait from chf-core on top of a Redis
//! `ConnectionManager`. Unit costs are stored as plain decimal strings so
//! that operators can provision them with `redis-cli SET`.
//!
//! # Example
//!
//! ```no_run
//! use chf_cache::RedisTariffStore;
//! use chf_core::traits::TariffStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisTariffStore::new("redis://127.0.0.1:6379").await?;
//!     store.set_unit_cost("imsi-208930000000001", 5, "0.25").await?;
//!     Ok(())
//! }
//! ```

pub mod keys;

use async_trait::async_trait;
use chf_core::traits::TariffStore;
use chf_core::{ChargingError, ChargingResult};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use tracing::{debug, error, warn};

/// Redis-backed tariff store
///
/// The connection manager is multiplexed and cheap to clone.
#[derive(Clone)]
pub struct RedisTariffStore {
    manager: ConnectionManager,
}

impl RedisTariffStore {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns `ChargingError::CacheConnection` if the URL is invalid or the
    /// connection cannot be established
    pub async fn new(url: &str) -> ChargingResult<Self> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            ChargingError::CacheConnection(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            ChargingError::CacheConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established successfully");
        Ok(Self { manager })
    }

    pub async fn ping(&self) -> ChargingResult<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                ChargingError::Cache(format!("Ping failed: {}", e))
            })?;
        Ok(())
    }

    /// Remove a provisioned unit cost
    ///
    /// Returns `true` when a tariff existed
    pub async fn remove_unit_cost(&self, subscriber: &str, rating_group: u32) -> ChargingResult<bool> {
        let key = keys::tariff_key(subscriber, rating_group);
        debug!("DEL {}", key);
        let mut conn = self.manager.clone();

        let deleted: i32 = conn.del(&key).await.map_err(Self::map_redis_error)?;
        Ok(deleted > 0)
    }

    #[cfg(test)]
    async fn flush_db(&self) -> ChargingResult<()> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;
        Ok(())
    }

    fn map_redis_error(err: RedisError) -> ChargingError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                ChargingError::CacheConnection(format!("I/O error: {}", err))
            }
            redis::ErrorKind::TypeError => {
                warn!("Redis type error: {}", err);
                ChargingError::Cache(format!("Type mismatch: {}", err))
            }
            _ => {
                error!("Redis error: {}", err);
                ChargingError::Cache(err.to_string())
            }
        }
    }
}

#[async_trait]
impl TariffStore for RedisTariffStore {
    async fn unit_cost(&self, subscriber: &str, rating_group: u32) -> ChargingResult<Option<String>> {
        let key = keys::tariff_key(subscriber, rating_group);
        debug!("GET {}", key);
        let mut conn = self.manager.clone();

        let value: Option<String> = conn.get(&key).await.map_err(Self::map_redis_error)?;
        if value.is_none() {
            debug!("No tariff stored under {}", key);
        }
        Ok(value)
    }

    async fn set_unit_cost(
        &self,
        subscriber: &str,
        rating_group: u32,
        unit_cost: &str,
    ) -> ChargingResult<()> {
        let key = keys::tariff_key(subscriber, rating_group);
        debug!("SET {} {}", key, unit_cost);
        let mut conn = self.manager.clone();

        let _: () = conn.set(&key, unit_cost).await.map_err(Self::map_redis_error)?;
        Ok(())
    }
}
