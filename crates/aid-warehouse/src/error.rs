//! Warehouse layer error types

use thiserror::Error;

/// Warehouse layer errors
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("DuckDB error: {0}")]
    DuckDb(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache miss for key: {0}")]
    CacheMiss(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WarehouseError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(feature = "duckdb")]
impl From<duckdb::Error> for WarehouseError {
    fn from(err: duckdb::Error) -> Self {
        Self::DuckDb(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for WarehouseError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
