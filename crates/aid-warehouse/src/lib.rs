//! # Aid Warehouse Library
//!
//! Source layer for the aid and conflict dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Dashboard Session                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Warehouse Trait                          │
//! │       (aid, political, civilian, healthcare, weapons)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Cached Warehouse Wrapper                    │
//! │                  (applies read strategy)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │  Query Cache            │   │        DuckDB                │
//! │  (memory or Redis)      │   │   (Source of Truth)          │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `duckdb`: Enable the DuckDB source (default)
//! - `redis`: Enable the Redis cache backend (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aid_warehouse::{CachedWarehouse, DuckDbWarehouse, MemoryCache, fetch_all};
//!
//! let source = DuckDbWarehouse::open("dashboard.duckdb")?;
//! let warehouse = CachedWarehouse::new(source, Arc::new(MemoryCache::new()));
//! let raw = fetch_all(&warehouse).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod cached;
pub mod error;
pub mod queries;
pub mod source;
pub mod strategy;

// Re-export commonly used types
pub use cache::{MemoryCache, QueryCache, SharedCache};
#[cfg(feature = "redis")]
pub use cache::{CacheConfig, RedisCache};
pub use cached::CachedWarehouse;
pub use error::{Result, WarehouseError};
pub use queries::WarehouseQuery;
#[cfg(feature = "duckdb")]
pub use source::DuckDbWarehouse;
pub use source::{Warehouse, fetch_all};
pub use strategy::ReadStrategy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
