use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A franchise is one continuous ownership lineage across seasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseRecord {
    /// Stable identifier (e.g., "F03")
    pub franchise_id: String,

    /// Manager name as it appears in the score tables
    pub manager_name: String,

    /// First season this mapping applies to
    pub start_year: Option<i32>,

    /// Last season this mapping applies to
    pub end_year: Option<i32>,

    /// Team names used by this franchise over the years
    pub aliases: Vec<String>,
}

impl FranchiseRecord {
    /// Create a record with no year bounds
    pub fn new(franchise_id: &str, manager_name: &str, aliases: &[&str]) -> Self {
        Self {
            franchise_id: franchise_id.to_string(),
            manager_name: manager_name.to_string(),
            start_year: None,
            end_year: None,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Builder-style year bounds
    pub fn with_years(mut self, start_year: Option<i32>, end_year: Option<i32>) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    /// Whether this mapping covers `season`
    pub fn active_in(&self, season: i32) -> bool {
        self.start_year.map_or(true, |start| season >= start)
            && self.end_year.map_or(true, |end| season <= end)
    }
}

/// A likely franchise for an unmatched (team, manager) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FranchiseSuggestion {
    pub team: String,
    pub manager: String,
    pub suggested_franchise: String,
    /// Similarity in [0, 1], rounded to two decimals
    pub confidence: f64,
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while loading the franchise map
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Required columns are absent from the header
    #[error("Missing columns {missing:?} in franchise map {}", path.display())]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// A year cell is present but not an integer
    #[error("Invalid {column} {value:?} at line {line} of {}", path.display())]
    InvalidYear { path: PathBuf, line: usize, column: String, value: String },
}
