//! Analytics error types.

use thiserror::Error;

/// Analytics errors.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Unknown selector option
    #[error("Domain error: {0}")]
    Domain(#[from] aid_domain::DomainError),

    /// Report serialization error
    #[error("Data conversion error: {0}")]
    Conversion(String),

    /// Malformed selector change
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Conversion(err.to_string())
    }
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
