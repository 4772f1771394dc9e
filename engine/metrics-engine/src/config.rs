//! # Configuration Management
//!
//! Configuration for the metrics engine and the `metrics-cli` binary.

use crate::expected_wins::TieRule;
use anyhow::{bail, Context};
use franchise_registry::DEFAULT_SUGGESTION_THRESHOLD;
use season_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the metrics engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Season store configuration
    pub store: StoreConfig,
    /// Expected-wins configuration
    pub expected_wins: ExpectedWinsConfig,
    /// Power score weights
    pub power: PowerWeights,
    /// Legacy index configuration
    pub legacy: LegacyConfig,
    /// Record book and summary table sizes
    pub records: RecordsConfig,
    /// Franchise suggestion configuration
    pub suggestions: SuggestionConfig,
}

/// Expected-wins configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExpectedWinsConfig {
    /// How an all-play tie is credited
    pub tie_rule: TieRule,
}

/// Weights of the power score components
///
/// Weights are divided by their sum, so only their ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerWeights {
    pub avg_points: f64,
    pub win_pct: f64,
    pub consistency: f64,
    pub luck: f64,
}

impl Default for PowerWeights {
    fn default() -> Self {
        Self { avg_points: 0.40, win_pct: 0.25, consistency: 0.20, luck: 0.15 }
    }
}

impl PowerWeights {
    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.avg_points + self.win_pct + self.consistency + self.luck
    }

    /// Weights scaled to sum to 1
    pub fn normalized(&self) -> Self {
        let total = self.total();
        Self {
            avg_points: self.avg_points / total,
            win_pct: self.win_pct / total,
            consistency: self.consistency / total,
            luck: self.luck / total,
        }
    }
}

/// Legacy index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// Per-season decay applied going back from the newest season
    pub decay: f64,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self { decay: 0.9 }
    }
}

/// Record book and summary table sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Rows shown in each record book table
    pub top_n: usize,
    /// Weeks in the rolling momentum window
    pub momentum_window: usize,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self { top_n: 10, momentum_window: 3 }
    }
}

/// Franchise suggestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Minimum similarity for a suggestion to be reported
    pub threshold: f64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_SUGGESTION_THRESHOLD }
    }
}

impl MetricsConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: MetricsConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `LEAGUE_*` environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(data_dir) = std::env::var("LEAGUE_DATA_DIR") {
            self.store.data_dir = data_dir.into();
        }

        if let Ok(decay) = std::env::var("LEAGUE_LEGACY_DECAY") {
            self.legacy.decay =
                decay.parse().with_context(|| format!("LEAGUE_LEGACY_DECAY={decay:?}"))?;
        }

        if let Ok(rule) = std::env::var("LEAGUE_TIE_RULE") {
            self.expected_wins.tie_rule = rule.parse()?;
        }

        if let Ok(top_n) = std::env::var("LEAGUE_TOP_N") {
            self.records.top_n = top_n.parse().with_context(|| format!("LEAGUE_TOP_N={top_n:?}"))?;
        }

        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.store.validate().map_err(anyhow::Error::msg)?;

        let w = &self.power;
        for (name, value) in [
            ("avg_points", w.avg_points),
            ("win_pct", w.win_pct),
            ("consistency", w.consistency),
            ("luck", w.luck),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("power weight {name} must be a non-negative number, got {value}");
            }
        }
        if w.total() <= 0.0 {
            bail!("power weights must sum to a positive value");
        }

        let decay = self.legacy.decay;
        if !(decay > 0.0 && decay <= 1.0) {
            bail!("legacy decay must be in (0, 1], got {decay}");
        }
        if self.records.top_n == 0 {
            bail!("records.top_n must be at least 1");
        }
        if self.records.momentum_window == 0 {
            bail!("records.momentum_window must be at least 1");
        }
        let threshold = self.suggestions.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("suggestion threshold must be in [0, 1], got {threshold}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = MetricsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.expected_wins.tie_rule, TieRule::Strict);
        assert!((config.power.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MetricsConfig = toml::from_str(
            r#"
            [legacy]
            decay = 0.8

            [expected_wins]
            tie_rule = "half_credit"
            "#,
        )
        .unwrap();
        assert_eq!(config.legacy.decay, 0.8);
        assert_eq!(config.expected_wins.tie_rule, TieRule::HalfCredit);
        assert_eq!(config.power, PowerWeights::default());
        assert_eq!(config.records.top_n, 10);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.toml");

        let mut config = MetricsConfig::default();
        config.power.luck = 0.5;
        config.store.data_dir = temp_dir.path().join("data");
        config.save_to_file(&path).unwrap();

        let loaded = MetricsConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.power.luck, 0.5);
        assert_eq!(loaded.store.data_dir, temp_dir.path().join("data"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MetricsConfig::default();
        config.legacy.decay = 0.0;
        assert!(config.validate().is_err());

        let mut config = MetricsConfig::default();
        config.power = PowerWeights { avg_points: 0.0, win_pct: 0.0, consistency: 0.0, luck: 0.0 };
        assert!(config.validate().is_err());

        let mut config = MetricsConfig::default();
        config.power.luck = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_weights_sum_to_one() {
        let w = PowerWeights { avg_points: 2.0, win_pct: 1.0, consistency: 1.0, luck: 0.0 };
        let n = w.normalized();
        assert_eq!(n.avg_points, 0.5);
        assert!((n.total() - 1.0).abs() < 1e-12);
    }
}
