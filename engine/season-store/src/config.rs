//! Configuration for the season store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File-name prefix of per-season score tables (`scores_2024.csv`)
pub const SCORES_PREFIX: &str = "scores_";

/// File-name prefix of per-season player tables (`player_stats_2024.csv`)
pub const PLAYER_STATS_PREFIX: &str = "player_stats_";

/// Configuration for the season store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory holding all league CSV files
    pub data_dir: PathBuf,

    /// Name of the concatenated multi-season file
    pub combined_file: String,

    /// Name of the franchise mapping table
    pub franchise_map_file: String,

    /// Name of the payout ledger export
    pub payouts_file: String,

    /// Directory (relative to `data_dir`) holding raw API dumps
    pub raw_api_dir: PathBuf,

    /// Keep parsed tables in memory keyed by (path, mtime)
    pub cache_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            combined_file: "combined_seasons_scores.csv".to_string(),
            franchise_map_file: "franchise_map.csv".to_string(),
            payouts_file: "payouts.csv".to_string(),
            raw_api_dir: PathBuf::from("raw/api"),
            cache_enabled: true,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with custom data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Default::default() }
    }

    /// Path of `scores_<season>.csv`
    pub fn scores_path(&self, season: i32) -> PathBuf {
        self.data_dir.join(format!("{SCORES_PREFIX}{season}.csv"))
    }

    /// Path of `player_stats_<season>.csv`
    pub fn player_stats_path(&self, season: i32) -> PathBuf {
        self.data_dir.join(format!("{PLAYER_STATS_PREFIX}{season}.csv"))
    }

    /// Path of the combined multi-season file
    pub fn combined_path(&self) -> PathBuf {
        self.data_dir.join(&self.combined_file)
    }

    /// Path of the franchise mapping table
    pub fn franchise_map_path(&self) -> PathBuf {
        self.data_dir.join(&self.franchise_map_file)
    }

    /// Path of the payout ledger export
    pub fn payouts_path(&self) -> PathBuf {
        self.data_dir.join(&self.payouts_file)
    }

    /// Root of raw API dumps (`<data_dir>/raw/api`)
    pub fn raw_api_root(&self) -> PathBuf {
        self.data_dir.join(&self.raw_api_dir)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }
        for (name, value) in [
            ("combined_file", &self.combined_file),
            ("franchise_map_file", &self.franchise_map_file),
            ("payouts_file", &self.payouts_file),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        if self.combined_file.starts_with(SCORES_PREFIX) {
            return Err(format!(
                "combined_file must not start with '{SCORES_PREFIX}' or it is mistaken for a season file"
            ));
        }
        Ok(())
    }
}
