//! Error types for the metrics engine

use franchise_registry::RegistryError;
use season_store::StoreError;
use thiserror::Error;

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors that can occur while deriving league tables
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Season table could not be read or failed validation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Franchise map could not be read
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Payout ledger could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested season or week has no usable rows
    #[error("No data available: {0}")]
    NoData(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MetricsError {
    /// True when the failure means "nothing to show" rather than bad data
    pub fn is_no_data(&self) -> bool {
        match self {
            MetricsError::NoData(_) => true,
            MetricsError::Store(e) => e.is_missing_file(),
            _ => false,
        }
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }
}
