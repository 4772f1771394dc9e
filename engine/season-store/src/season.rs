//! # Season Store
//!
//! Reads and writes the per-season CSV tables under the data directory.

use crate::cache::TableCache;
use crate::config::{StoreConfig, PLAYER_STATS_PREFIX, SCORES_PREFIX};
use crate::error::{Result, StoreError};
use crate::schema::{
    ensure_unique_keys, parse_player_record, parse_score_record, HeaderIndex, PlayerStatRow,
    ScoreRow, REQUIRED_PLAYER_COLUMNS, REQUIRED_SCORE_COLUMNS,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of loading every available season
#[derive(Debug, Default)]
pub struct MultiSeasonLoad {
    /// Rows of every season that loaded cleanly, in season order
    pub rows: Vec<ScoreRow>,
    /// Seasons that contributed rows
    pub loaded: Vec<i32>,
    /// Seasons that were skipped, with the reason
    pub skipped: Vec<(i32, String)>,
}

/// Outcome of splitting the combined file back into season files
#[derive(Debug, Default)]
pub struct BackfillReport {
    pub written: Vec<i32>,
    pub kept_existing: Vec<i32>,
}

/// CSV-backed store of season score and player stat tables
#[derive(Debug)]
pub struct SeasonStore {
    config: StoreConfig,
    scores: TableCache<Vec<ScoreRow>>,
    players: TableCache<Vec<PlayerStatRow>>,
}

impl SeasonStore {
    /// Create a store over the configured data directory
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::invalid_operation)?;
        Ok(Self { config, scores: TableCache::new(), players: TableCache::new() })
    }

    /// Create a store with default configuration rooted at `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::new(data_dir))
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the data directory
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Seasons with a `scores_<season>.csv` file, ascending
    pub fn seasons_available(&self) -> Result<Vec<i32>> {
        self.discover(SCORES_PREFIX)
    }

    /// Seasons with a `player_stats_<season>.csv` file, ascending
    pub fn player_seasons_available(&self) -> Result<Vec<i32>> {
        self.discover(PLAYER_STATS_PREFIX)
    }

    fn discover(&self, prefix: &str) -> Result<Vec<i32>> {
        let entries = match fs::read_dir(self.data_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Data directory {} does not exist", self.data_dir().display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut seasons = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_prefix(prefix).and_then(|s| s.strip_suffix(".csv")) else {
                continue;
            };
            match stem.parse::<i32>() {
                Ok(season) => seasons.push(season),
                Err(_) => warn!("Skipping unrecognized file name: {}", name),
            }
        }
        seasons.sort_unstable();
        seasons.dedup();
        Ok(seasons)
    }

    /// Load one season's score table
    pub fn load_season(&self, season: i32) -> Result<Arc<Vec<ScoreRow>>> {
        let path = self.config.scores_path(season);
        if self.config.cache_enabled {
            self.scores.get_or_load(&path, |p| read_scores(p, Some(season)))
        } else {
            read_scores(&path, Some(season)).map(Arc::new)
        }
    }

    /// Load every season file, isolating per-season failures.
    ///
    /// A missing, empty or malformed season is logged and listed in
    /// `skipped`; it never prevents the other seasons from loading.
    pub fn load_all_seasons(&self) -> Result<MultiSeasonLoad> {
        let mut out = MultiSeasonLoad::default();
        for season in self.seasons_available()? {
            match self.load_season(season) {
                Ok(rows) => {
                    out.rows.extend(rows.iter().cloned());
                    out.loaded.push(season);
                }
                Err(e) => {
                    warn!("Skipping season {}: {}", season, e);
                    out.skipped.push((season, e.to_string()));
                }
            }
        }
        info!(
            "Loaded {} rows from {} season(s), skipped {}",
            out.rows.len(),
            out.loaded.len(),
            out.skipped.len()
        );
        Ok(out)
    }

    /// Rewrite `scores_<season>.csv` atomically with the given rows
    pub fn write_season(&self, season: i32, rows: &[ScoreRow]) -> Result<PathBuf> {
        if let Some(bad) = rows.iter().find(|r| r.season != season) {
            return Err(StoreError::invalid_operation(format!(
                "row for season {} cannot be written to season {}",
                bad.season, season
            )));
        }
        ensure_unique_keys(rows)?;

        let path = self.config.scores_path(season);
        write_rows_atomic(&path, rows)?;
        self.scores.invalidate(&path);
        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Load the combined multi-season file
    pub fn load_combined(&self) -> Result<Arc<Vec<ScoreRow>>> {
        let path = self.config.combined_path();
        if self.config.cache_enabled {
            self.scores.get_or_load(&path, |p| read_scores(p, None))
        } else {
            read_scores(&path, None).map(Arc::new)
        }
    }

    /// Concatenate every loadable season into the combined file.
    ///
    /// Projections are dropped because older seasons do not carry them.
    pub fn write_combined(&self) -> Result<MultiSeasonLoad> {
        let mut load = self.load_all_seasons()?;
        if load.rows.is_empty() {
            return Err(StoreError::invalid_operation("no valid season data to combine"));
        }
        for row in &mut load.rows {
            row.projected_points = None;
        }
        let path = self.config.combined_path();
        write_rows_atomic(&path, &load.rows)?;
        self.scores.invalidate(&path);
        info!("Combined file saved to {} ({} total rows)", path.display(), load.rows.len());
        Ok(load)
    }

    /// Split the combined file into per-season files.
    ///
    /// Existing season files are left untouched unless `overwrite` is set.
    pub fn backfill_from_combined(&self, overwrite: bool) -> Result<BackfillReport> {
        let combined = self.load_combined()?;
        let mut by_season: BTreeMap<i32, Vec<ScoreRow>> = BTreeMap::new();
        for row in combined.iter() {
            by_season.entry(row.season).or_default().push(row.clone());
        }

        let mut report = BackfillReport::default();
        for (season, rows) in by_season {
            if self.config.scores_path(season).exists() && !overwrite {
                debug!("Keeping existing scores file for season {}", season);
                report.kept_existing.push(season);
                continue;
            }
            self.write_season(season, &rows)?;
            report.written.push(season);
        }
        Ok(report)
    }

    /// Load one season's player stat table
    pub fn load_player_stats(&self, season: i32) -> Result<Arc<Vec<PlayerStatRow>>> {
        let path = self.config.player_stats_path(season);
        if self.config.cache_enabled {
            self.players.get_or_load(&path, |p| read_player_stats(p, Some(season)))
        } else {
            read_player_stats(&path, Some(season)).map(Arc::new)
        }
    }

    /// Rewrite `player_stats_<season>.csv` atomically.
    ///
    /// Rows must belong to `season` and (week, team, player) must be unique.
    pub fn write_player_stats(&self, season: i32, rows: &[PlayerStatRow]) -> Result<PathBuf> {
        if rows.is_empty() {
            return Err(StoreError::invalid_operation(format!(
                "no player rows to write for season {season}"
            )));
        }
        if let Some(bad) = rows.iter().find(|r| r.season != season || r.week == 0) {
            return Err(StoreError::invalid_operation(format!(
                "player row {} (season {}, week {}) cannot be written to season {}",
                bad.player_name, bad.season, bad.week, season
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) =
            rows.iter().find(|r| !seen.insert((r.week, r.team.as_str(), r.player_name.as_str())))
        {
            return Err(StoreError::invalid_operation(format!(
                "duplicate player row for {} on {} in week {}",
                dup.player_name, dup.team, dup.week
            )));
        }

        let path = self.config.player_stats_path(season);
        write_rows_atomic(&path, rows)?;
        self.players.invalidate(&path);
        info!("Wrote {} player rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Drop every cached table
    pub fn clear_cache(&self) {
        self.scores.clear();
        self.players.clear();
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    match fs::File::open(path) {
        Ok(file) => Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::MissingFile { path: path.to_path_buf() })
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a score table, validating its header, cells and key uniqueness
pub fn read_scores(path: &Path, season_hint: Option<i32>) -> Result<Vec<ScoreRow>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(StoreError::EmptyTable { path: path.to_path_buf() });
    }
    let header = HeaderIndex::new(path, &headers);
    header.require(REQUIRED_SCORE_COLUMNS)?;
    if season_hint.is_none() {
        header.require(&["season"])?;
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Line 1 is the header
        rows.push(parse_score_record(&header, &record, i + 2, season_hint)?);
    }
    if rows.is_empty() {
        return Err(StoreError::EmptyTable { path: path.to_path_buf() });
    }
    ensure_unique_keys(&rows)?;
    debug!("Parsed {} score rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse a player stat table
pub fn read_player_stats(path: &Path, season_hint: Option<i32>) -> Result<Vec<PlayerStatRow>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    let header = HeaderIndex::new(path, &headers);
    header.require(REQUIRED_PLAYER_COLUMNS)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        rows.push(parse_player_record(&header, &record?, i + 2, season_hint)?);
    }
    if rows.is_empty() {
        return Err(StoreError::EmptyTable { path: path.to_path_buf() });
    }
    Ok(rows)
}

/// Write rows to `<path>.tmp` and rename over `path`
fn write_rows_atomic<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
