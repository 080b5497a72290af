//! Read strategy implementations using enum dispatch.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::error::{Result, WarehouseError};

/// Read strategy enum - determines cache/warehouse access pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Check cache first, fall back to the warehouse on miss
    #[default]
    CacheFirst,
    /// Only read from the warehouse, skip cache
    SourceOnly,
    /// Only read from cache, never hit the warehouse
    CacheOnly,
    /// Read from the warehouse, populate cache on success
    ReadThrough,
}

impl ReadStrategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache_first",
            Self::SourceOnly => "source_only",
            Self::CacheOnly => "cache_only",
            Self::ReadThrough => "read_through",
        }
    }

    /// Execute a read operation according to the strategy.
    ///
    /// - `cache_fn`: reads the serialized payload from cache
    /// - `source_fn`: reads from the warehouse
    /// - `populate_fn`: stores the serialized payload after a warehouse read
    ///
    /// Cache failures are logged and bypassed except under `CacheOnly`,
    /// where they and misses are returned as errors.
    ///
    /// # Errors
    ///
    /// Returns the warehouse error, or the cache error / [`WarehouseError::CacheMiss`]
    /// under `CacheOnly`.
    pub async fn read<T, CacheFut, SourceFut, PopulateFut>(
        &self,
        key: &str,
        cache_fn: impl FnOnce() -> CacheFut,
        source_fn: impl FnOnce() -> SourceFut,
        populate_fn: impl FnOnce(String) -> PopulateFut,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        CacheFut: Future<Output = Result<Option<String>>>,
        SourceFut: Future<Output = Result<T>>,
        PopulateFut: Future<Output = Result<()>>,
    {
        match self {
            Self::CacheFirst => {
                match cache_fn().await {
                    Ok(Some(payload)) => match serde_json::from_str(&payload) {
                        Ok(value) => {
                            tracing::debug!(key, "Cache hit");
                            return Ok(value);
                        }
                        Err(e) => {
                            tracing::warn!(key, error = %e, "Undecodable cache entry, reading warehouse");
                        }
                    },
                    Ok(None) => {
                        tracing::debug!(key, "Cache miss, reading warehouse");
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Cache error, reading warehouse");
                    }
                }

                let value = source_fn().await?;
                populate(key, &value, populate_fn).await;
                Ok(value)
            }

            Self::SourceOnly => source_fn().await,

            Self::CacheOnly => {
                let payload = cache_fn()
                    .await?
                    .ok_or_else(|| WarehouseError::CacheMiss(key.to_string()))?;
                tracing::debug!(key, "Cache hit");
                Ok(serde_json::from_str(&payload)?)
            }

            Self::ReadThrough => {
                let value = source_fn().await?;
                populate(key, &value, populate_fn).await;
                Ok(value)
            }
        }
    }
}

async fn populate<T, PopulateFut>(key: &str, value: &T, populate_fn: impl FnOnce(String) -> PopulateFut)
where
    T: Serialize,
    PopulateFut: Future<Output = Result<()>>,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to serialize cache entry");
            return;
        }
    };
    if let Err(e) = populate_fn(payload).await {
        tracing::warn!(key, error = %e, "Failed to populate cache");
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadStrategy {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cache_first" => Ok(Self::CacheFirst),
            "source_only" | "db_only" => Ok(Self::SourceOnly),
            "cache_only" => Ok(Self::CacheOnly),
            "read_through" => Ok(Self::ReadThrough),
            other => Err(WarehouseError::InvalidConfig(format!(
                "unknown read strategy '{other}'"
            ))),
        }
    }
}
