//! Error types for the season store

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for season store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing season tables
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The requested table file does not exist
    #[error("No data available: {} does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// Required columns are absent from the header
    #[error("Missing columns {missing:?} in {}", path.display())]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// The table has a header but no data rows
    #[error("No rows in {}", path.display())]
    EmptyTable { path: PathBuf },

    /// A required cell is blank or fails to parse
    #[error("Invalid value {value:?} for column '{column}' at line {line} of {}", path.display())]
    InvalidValue { path: PathBuf, line: usize, column: String, value: String },

    /// (season, week, team) appears more than once
    #[error("Duplicate row for season {season}, week {week}, team '{team}'")]
    DuplicateKey { season: i32, week: u32, team: String },

    /// Operation refused for the current state of the data directory
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// True for the "no data available" case, which callers treat as non-fatal
    pub fn is_missing_file(&self) -> bool {
        matches!(self, StoreError::MissingFile { .. })
    }

    /// True for schema/value validation failures
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::MissingColumns { .. }
                | StoreError::EmptyTable { .. }
                | StoreError::InvalidValue { .. }
                | StoreError::DuplicateKey { .. }
        )
    }

    /// Create a new invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
