//! Dashboard service error types

use thiserror::Error;

/// Dashboard errors
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Warehouse(#[from] aid_warehouse::WarehouseError),

    #[error(transparent)]
    Analytics(#[from] aid_analytics::AnalyticsError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
