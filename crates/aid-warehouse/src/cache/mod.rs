//! # Cache Module
//!
//! Memoization of warehouse query results. Payloads are JSON strings keyed
//! by [`WarehouseQuery::cache_key`](crate::queries::WarehouseQuery::cache_key).

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_client;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_client::{CacheConfig, RedisCache};

/// Default lifetime of a memoized query result
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Key/value store for serialized query results
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Raw payload for `key`, `None` on miss or expiry
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `payload` under `key` for `ttl`
    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<()>;

    /// Remove `key`; returns whether anything was deleted
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Shared cache handle
pub type SharedCache = Arc<dyn QueryCache>;
