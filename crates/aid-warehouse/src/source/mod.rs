//! # Source Module
//!
//! The `Warehouse` seam and its implementations.

#[cfg(feature = "duckdb")]
pub mod duckdb_impl;
pub mod traits;

#[cfg(feature = "duckdb")]
pub use duckdb_impl::DuckDbWarehouse;
pub use traits::{Warehouse, fetch_all};
