//! # Strategy Module
//!
//! Enum-based cache/warehouse access strategies using dispatch pattern.
//!
//! ## Read Strategies
//! - `CacheFirst` - Check cache, fall back to the warehouse on miss (default)
//! - `SourceOnly` - Skip cache entirely
//! - `CacheOnly` - Never hit the warehouse
//! - `ReadThrough` - Always read the warehouse, populate cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use aid_warehouse::strategy::ReadStrategy;
//!
//! let rows: Vec<PoliticalEvent> = ReadStrategy::CacheFirst
//!     .read(
//!         &key,
//!         || cache.get(&key),
//!         || warehouse.political_events(),
//!         |payload| cache.set(&key, payload, ttl),
//!     )
//!     .await?;
//! ```

pub mod read_strategy;

pub use read_strategy::ReadStrategy;
