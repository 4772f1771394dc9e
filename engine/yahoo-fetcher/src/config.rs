use anyhow::{bail, Context};
use season_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the Yahoo fetcher
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FetcherConfig {
    /// Yahoo Fantasy API configuration
    pub yahoo: YahooConfig,

    /// Where raw dumps and season tables live
    pub store: StoreConfig,

    /// Retry configuration for each request
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YahooConfig {
    /// Base URL of the Fantasy Sports v2 API
    pub api_base: String,

    /// Environment variable holding an already-issued OAuth bearer token
    pub access_token_env: String,

    /// League key per season (e.g. `"2023" = "423.l.132892"`)
    pub league_keys: BTreeMap<String, String>,

    /// Last regular + playoff week to request
    pub end_week: u32,

    /// Pause between requests in milliseconds
    pub request_delay_ms: u64,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_retries: u32,

    /// Initial retry delay in seconds
    pub initial_delay_secs: u64,

    /// Maximum retry delay in seconds
    pub max_delay_secs: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            api_base: "https://fantasysports.yahooapis.com/fantasy/v2".to_string(),
            access_token_env: "YAHOO_ACCESS_TOKEN".to_string(),
            league_keys: BTreeMap::new(),
            end_week: 17,
            request_delay_ms: 200,
            timeout_secs: 30,
            use_system_proxy: true,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay_secs: 5, max_delay_secs: 300, backoff_multiplier: 2.0 }
    }
}

impl FetcherConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(data_dir) = std::env::var("LEAGUE_DATA_DIR") {
            self.store.data_dir = data_dir.into();
        }

        if let Ok(base) = std::env::var("YAHOO_API_BASE") {
            self.yahoo.api_base = base;
        }

        if let Ok(end_week) = std::env::var("YAHOO_END_WEEK") {
            self.yahoo.end_week =
                end_week.parse().with_context(|| format!("YAHOO_END_WEEK={end_week:?}"))?;
        }

        Ok(self)
    }

    /// Get the bearer token from the environment
    pub fn access_token(&self) -> anyhow::Result<String> {
        std::env::var(&self.yahoo.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .with_context(|| {
                format!("Yahoo access token not found in ${}", self.yahoo.access_token_env)
            })
    }

    /// League key configured for a season
    pub fn league_key(&self, season: i32) -> anyhow::Result<&str> {
        self.yahoo
            .league_keys
            .get(&season.to_string())
            .map(String::as_str)
            .with_context(|| format!("No league key configured for season {season}"))
    }

    /// Seasons with a configured league key, ascending
    pub fn seasons(&self) -> anyhow::Result<Vec<i32>> {
        let mut seasons = self
            .yahoo
            .league_keys
            .keys()
            .map(|key| key.parse().with_context(|| format!("Invalid season key {key:?}")))
            .collect::<anyhow::Result<Vec<i32>>>()?;
        seasons.sort_unstable();
        Ok(seasons)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.store.validate().map_err(anyhow::Error::msg)?;
        if self.yahoo.end_week == 0 {
            bail!("yahoo.end_week must be at least 1");
        }
        if self.retry.max_retries == 0 {
            bail!("retry.max_retries must be at least 1");
        }
        if !(self.retry.backoff_multiplier >= 1.0) {
            bail!("retry.backoff_multiplier must be >= 1.0");
        }
        self.seasons()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = FetcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.league_key(2023).is_err());
    }

    #[test]
    fn test_league_keys_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fetcher.toml");
        std::fs::write(
            &path,
            "[yahoo]\nend_week = 16\n\n[yahoo.league_keys]\n2023 = \"423.l.132892\"\n2011 = \"257.l.114705\"\n",
        )
        .unwrap();

        let config = FetcherConfig::load_from_file(&path).unwrap();
        assert_eq!(config.yahoo.end_week, 16);
        assert_eq!(config.league_key(2023).unwrap(), "423.l.132892");
        assert_eq!(config.seasons().unwrap(), vec![2011, 2023]);
        assert_eq!(config.yahoo.access_token_env, "YAHOO_ACCESS_TOKEN");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = FetcherConfig::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_err());
    }
}
