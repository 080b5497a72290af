//! # Aid Analytics
//!
//! Aggregation pipeline behind the aid and conflict dashboard.
//!
//! ## Stages
//!
//! - Filter: conjunctive equality constraints, `All` meaning no constraint
//! - Group-and-sum: one row per distinct key combination
//! - Rank-and-truncate: stable sort by value, first N rows
//! - Melt: wide counters to `(date, group, value)` rows
//!
//! Views compose the stages into the tables each dashboard section shows,
//! and [`DashboardSession`] rebuilds a section only after one of its
//! selections changed.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod format;
pub mod reports;
pub mod session;
pub mod table;
pub mod views;

pub use error::{AnalyticsError, Result};
pub use format::{format_count, format_large_number, format_percent, percentage_of_total};
pub use reports::DashboardReport;
pub use session::{DashboardParams, DashboardSession, ParamChange, Section};
pub use table::{Filter, GroupedRow, LongRow, SortOrder, group_sum, melt, rank_top_n};
