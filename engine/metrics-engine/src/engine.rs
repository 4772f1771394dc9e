//! # Metrics Engine
//!
//! Binds the season store, the franchise registry and the configuration so
//! callers can ask for a derived table by season.

use crate::config::MetricsConfig;
use crate::error::{MetricsError, Result};
use crate::legacy::{compute_legacy, FranchiseLegacyEntry};
use crate::payouts::{build_ledger, load_payouts, PayoutLedger};
use crate::players::{season_leaders, top_single_weeks, PlayerTotal, PlayerWeek};
use crate::records::{
    compare_seasons, hall_of_fame, matchup_summary, projection_efficiency, record_book,
    weekly_awards, HallOfFameEntry, MatchupSummary, ProjectionEfficiency, RecordBook,
    SeasonComparison, WeeklyAwards,
};
use crate::summary::{summarize_all, summarize_season, TeamSeasonSummary};
use franchise_registry::{FranchiseRegistry, FranchiseSuggestion};
use season_store::{pairing_issues, PairingIssue, ScoreRow, SeasonStore};
use std::path::PathBuf;
use tracing::{info, warn};

/// Metrics engine over one data directory
#[derive(Debug)]
pub struct MetricsEngine {
    store: SeasonStore,
    config: MetricsConfig,
}

impl MetricsEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: MetricsConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let store = SeasonStore::new(config.store.clone())?;
        info!("Metrics engine using data directory {}", store.data_dir().display());
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn store(&self) -> &SeasonStore {
        &self.store
    }

    /// Seasons with a score table
    pub fn seasons(&self) -> Result<Vec<i32>> {
        Ok(self.store.seasons_available()?)
    }

    /// Newest season with a score table
    pub fn latest_season(&self) -> Result<i32> {
        self.seasons()?
            .last()
            .copied()
            .ok_or_else(|| MetricsError::no_data("no season files found"))
    }

    /// Score rows of one season
    pub fn season_rows(&self, season: i32) -> Result<Vec<ScoreRow>> {
        Ok(self.store.load_season(season)?.as_ref().clone())
    }

    /// Score rows of every season that loads
    pub fn all_rows(&self) -> Result<Vec<ScoreRow>> {
        let load = self.store.load_all_seasons()?;
        if load.rows.is_empty() {
            return Err(MetricsError::no_data("no season loaded successfully"));
        }
        Ok(load.rows)
    }

    /// Team summaries of one season
    pub fn season_summary(&self, season: i32) -> Result<Vec<TeamSeasonSummary>> {
        summarize_season(&self.season_rows(season)?, season, &self.config)
    }

    /// Team summaries of every season
    pub fn all_summaries(&self) -> Result<Vec<TeamSeasonSummary>> {
        Ok(summarize_all(&self.all_rows()?, &self.config))
    }

    /// Franchise legacy table across every season
    pub fn legacy(&self) -> Result<Vec<FranchiseLegacyEntry>> {
        Ok(compute_legacy(&self.all_summaries()?, self.config.legacy.decay))
    }

    pub fn record_book(&self) -> Result<RecordBook> {
        Ok(record_book(&self.all_rows()?, self.config.records.top_n))
    }

    pub fn weekly_awards(&self, season: i32, week: u32) -> Result<WeeklyAwards> {
        weekly_awards(&self.season_rows(season)?, season, week)
    }

    pub fn matchup_summary(&self, season: i32, week: u32) -> Result<MatchupSummary> {
        let window = self.config.records.momentum_window;
        matchup_summary(&self.season_rows(season)?, season, week, window)
    }

    pub fn hall_of_fame(&self) -> Result<Vec<HallOfFameEntry>> {
        Ok(hall_of_fame(&self.all_summaries()?))
    }

    /// Compare two seasons (deltas are `season_b` − `season_a`)
    pub fn compare_seasons(&self, season_a: i32, season_b: i32) -> Result<Vec<SeasonComparison>> {
        let mut summaries = self.season_summary(season_a)?;
        summaries.extend(self.season_summary(season_b)?);
        Ok(compare_seasons(&summaries, season_a, season_b))
    }

    /// Projection efficiency for one season, or every season when `None`
    pub fn projection_efficiency(&self, season: Option<i32>) -> Result<Vec<ProjectionEfficiency>> {
        let rows = match season {
            Some(season) => self.season_rows(season)?,
            None => self.all_rows()?,
        };
        Ok(projection_efficiency(&rows))
    }

    /// Season scoring leaders and best single weeks
    pub fn player_leaders(&self, season: i32) -> Result<(Vec<PlayerTotal>, Vec<PlayerWeek>)> {
        let rows = self.store.load_player_stats(season)?;
        let top_n = self.config.records.top_n;
        Ok((season_leaders(&rows, top_n), top_single_weeks(&rows, top_n)))
    }

    /// Payout ledger for one year, or all time when `None`
    pub fn payouts(&self, year: Option<i32>) -> Result<PayoutLedger> {
        let rows = load_payouts(&self.config.store.payouts_path())?;
        Ok(build_ledger(&rows, year))
    }

    /// Pairing problems in one season
    pub fn pairing_issues(&self, season: i32) -> Result<Vec<PairingIssue>> {
        Ok(pairing_issues(&self.season_rows(season)?))
    }

    fn registry(&self) -> Result<FranchiseRegistry> {
        Ok(FranchiseRegistry::load_from_file(self.config.store.franchise_map_path())?)
    }

    /// Fuzzy franchise suggestions for every unmatched team/manager pair
    pub fn franchise_suggestions(&self) -> Result<Vec<FranchiseSuggestion>> {
        let registry = self.registry()?;
        let rows = self.all_rows()?;
        let pairs = registry.unmatched_pairs(&rows);
        Ok(registry.suggest(
            pairs.iter().map(|(team, manager)| (team.as_str(), manager.as_str())),
            self.config.suggestions.threshold,
        ))
    }

    /// Stamp franchise ids onto every season file and rewrite it.
    ///
    /// Returns the rewritten paths and the number of rows left unmatched.
    pub fn stamp_franchises(&self) -> Result<(Vec<PathBuf>, usize)> {
        let registry = self.registry()?;
        if registry.is_empty() {
            warn!("Franchise map is empty; nothing to stamp");
            return Ok((Vec::new(), 0));
        }

        let mut written = Vec::new();
        let mut unmatched = 0;
        for season in self.seasons()? {
            let mut rows = match self.season_rows(season) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Skipping season {}: {}", season, e);
                    continue;
                }
            };
            unmatched += registry.stamp_rows(&mut rows);
            written.push(self.store.write_season(season, &rows)?);
        }
        Ok((written, unmatched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine_with_data(temp_dir: &TempDir) -> MetricsEngine {
        let mut config = MetricsConfig::default();
        config.store.data_dir = temp_dir.path().to_path_buf();
        let engine = MetricsEngine::new(config).unwrap();

        for season in [2022, 2023] {
            let rows = vec![
                ScoreRow::new(season, 1, "Alpha Dogs", "Ann", "Beta", 110.0, 90.0),
                ScoreRow::new(season, 1, "Beta", "Bob", "Alpha Dogs", 90.0, 110.0),
                ScoreRow::new(season, 2, "Alpha Dogs", "Ann", "Beta", 95.0, 105.0),
                ScoreRow::new(season, 2, "Beta", "Bob", "Alpha Dogs", 105.0, 95.0),
            ];
            engine.store().write_season(season, &rows).unwrap();
        }
        engine
    }

    #[test]
    fn test_engine_tables_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with_data(&temp_dir);

        assert_eq!(engine.latest_season().unwrap(), 2023);
        assert_eq!(engine.season_summary(2023).unwrap().len(), 2);
        assert_eq!(engine.all_summaries().unwrap().len(), 4);
        assert_eq!(engine.legacy().unwrap().len(), 2);
        assert_eq!(engine.hall_of_fame().unwrap().len(), 2);
        assert_eq!(engine.compare_seasons(2022, 2023).unwrap().len(), 2);
        assert!(engine.pairing_issues(2022).unwrap().is_empty());
        assert!(engine.projection_efficiency(None).unwrap().is_empty());
        assert!(engine.season_summary(2030).unwrap_err().is_no_data());
        assert!(engine.payouts(None).unwrap_err().is_no_data());
    }

    #[test]
    fn test_stamp_franchises_rewrites_seasons() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with_data(&temp_dir);
        fs::write(
            temp_dir.path().join("franchise_map.csv"),
            "franchise_id,manager_name,start_year,end_year,aliases\nF01,Ann,,,Alpha Dogs\n",
        )
        .unwrap();

        let suggestions = engine.franchise_suggestions().unwrap();
        assert!(suggestions.iter().all(|s| s.team == "Beta"));

        let (written, unmatched) = engine.stamp_franchises().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(unmatched, 4);

        let rows = engine.season_rows(2023).unwrap();
        assert_eq!(rows[0].franchise_id.as_deref(), Some("F01"));
        assert!(rows[1].franchise_id.is_none());

        let legacy = engine.legacy().unwrap();
        assert!(legacy.iter().any(|e| e.identity.key() == "F01" && e.seasons == 2));
    }
}
