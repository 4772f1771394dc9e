//! Raw dumps → `scores_<season>.csv` and `player_stats_<season>.csv`

use crate::raw::{roster_files, scoreboard_files, season_dir, season_dirs};
use crate::roster::parse_roster_file;
use crate::scoreboard::parse_scoreboard_file;
use anyhow::{bail, Result};
use franchise_registry::FranchiseRegistry;
use season_store::{PlayerStatRow, ScoreRow, SeasonStore};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of building one season table
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonBuild {
    pub season: i32,
    pub weeks_parsed: Vec<u32>,
    /// Weeks whose dump could not be parsed, with the reason
    pub weeks_failed: Vec<(u32, String)>,
    pub rows: usize,
    /// Rows the franchise map could not resolve
    pub unmatched: usize,
    /// Written table, `None` when no week produced rows
    pub path: Option<PathBuf>,
}

/// Build one season from `<raw root>/<season>/scoreboard_week_*.json`.
///
/// A week that fails to parse is logged and left out; the other weeks still
/// land in the table.
pub fn build_season(
    store: &SeasonStore,
    registry: &FranchiseRegistry,
    season: i32,
) -> Result<SeasonBuild> {
    let dir = season_dir(&store.config().raw_api_root(), season);
    let mut build = SeasonBuild {
        season,
        weeks_parsed: Vec::new(),
        weeks_failed: Vec::new(),
        rows: 0,
        unmatched: 0,
        path: None,
    };

    let mut rows: Vec<ScoreRow> = Vec::new();
    for (week, path) in scoreboard_files(&dir)? {
        match parse_scoreboard_file(&path) {
            Ok(parsed) => {
                let (ours, foreign): (Vec<ScoreRow>, Vec<ScoreRow>) =
                    parsed.into_iter().partition(|r| r.season == season);
                if !foreign.is_empty() {
                    warn!(
                        "{}: {} rows belong to another season, dropped",
                        path.display(),
                        foreign.len()
                    );
                }
                rows.extend(ours);
                build.weeks_parsed.push(week);
            }
            Err(e) => {
                warn!("Skipping week {} of season {}: {:#}", week, season, e);
                build.weeks_failed.push((week, format!("{e:#}")));
            }
        }
    }

    if rows.is_empty() {
        warn!("No rows parsed for season {}", season);
        return Ok(build);
    }

    build.unmatched = registry.stamp_rows(&mut rows);
    build.rows = rows.len();
    build.path = Some(store.write_season(season, &rows)?);
    info!("Built season {}: {} rows from {} weeks", season, build.rows, build.weeks_parsed.len());
    Ok(build)
}

/// Outcome of building one season's player stat table
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatsBuild {
    pub season: i32,
    pub weeks_parsed: Vec<u32>,
    /// Roster dumps that could not be parsed as (team dir, week, reason)
    pub files_failed: Vec<(String, u32, String)>,
    pub rows: usize,
    /// Written table, `None` when no roster produced rows
    pub path: Option<PathBuf>,
}

/// Build one season's player stats from `<raw root>/<season>/rosters/*/week_*.json`.
///
/// A roster dump that fails to parse is logged and left out. A player
/// listed twice for the same team and week keeps its first row.
pub fn build_player_stats(store: &SeasonStore, season: i32) -> Result<PlayerStatsBuild> {
    let dir = season_dir(&store.config().raw_api_root(), season);
    let mut build = PlayerStatsBuild {
        season,
        weeks_parsed: Vec::new(),
        files_failed: Vec::new(),
        rows: 0,
        path: None,
    };

    let mut rows: Vec<PlayerStatRow> = Vec::new();
    let mut weeks = BTreeSet::new();
    for (team, week, path) in roster_files(&dir)? {
        match parse_roster_file(&path, season, week, &team) {
            Ok(parsed) => {
                rows.extend(parsed);
                weeks.insert(week);
            }
            Err(e) => {
                warn!("Skipping roster {} week {} of season {}: {:#}", team, week, season, e);
                build.files_failed.push((team, week, format!("{e:#}")));
            }
        }
    }

    let mut seen = HashSet::new();
    let before = rows.len();
    rows.retain(|r| seen.insert((r.week, r.team.clone(), r.player_name.clone())));
    if rows.len() < before {
        warn!("Season {}: dropped {} duplicate player rows", season, before - rows.len());
    }

    build.weeks_parsed = weeks.into_iter().collect();
    if rows.is_empty() {
        warn!("No player rows parsed for season {}", season);
        return Ok(build);
    }

    build.rows = rows.len();
    build.path = Some(store.write_player_stats(season, &rows)?);
    info!("Built player stats for season {}: {} rows", season, build.rows);
    Ok(build)
}

/// Build every season directory under the raw root.
///
/// A season that fails is logged and skipped.
pub fn build_all(store: &SeasonStore, registry: &FranchiseRegistry) -> Result<Vec<SeasonBuild>> {
    let root = store.config().raw_api_root();
    let seasons = season_dirs(&root)?;
    if seasons.is_empty() {
        bail!("No season directories under {}", root.display());
    }

    let mut builds = Vec::new();
    for (season, _) in seasons {
        match build_season(store, registry, season) {
            Ok(build) => builds.push(build),
            Err(e) => warn!("Failed to build season {}: {:#}", season, e),
        }
    }
    Ok(builds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{roster_path, scoreboard_path, write_json};
    use crate::roster::tests::{player, roster};
    use crate::scoreboard::tests::{scoreboard, team};
    use franchise_registry::FranchiseRecord;
    use std::fs;
    use tempfile::TempDir;

    fn seed(store: &SeasonStore) {
        let root = store.config().raw_api_root();
        for week in 1..=2 {
            let doc = scoreboard(
                "2023",
                week,
                vec![vec![team("Alpha", "Ann", "110", None), team("Beta", "Bob", "95", None)]],
            );
            write_json(&scoreboard_path(&root, 2023, week), &doc).unwrap();
        }
        fs::write(scoreboard_path(&root, 2023, 3), "{ not json").unwrap();
    }

    #[test]
    fn test_build_isolates_bad_weeks_and_stamps() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeasonStore::open(temp_dir.path()).unwrap();
        seed(&store);
        let registry =
            FranchiseRegistry::from_records(vec![FranchiseRecord::new("F01", "Ann", &[])]);

        let build = build_season(&store, &registry, 2023).unwrap();
        assert_eq!(build.weeks_parsed, vec![1, 2]);
        assert_eq!(build.weeks_failed.len(), 1);
        assert_eq!(build.weeks_failed[0].0, 3);
        assert_eq!(build.rows, 4);
        assert_eq!(build.unmatched, 2);

        let rows = store.load_season(2023).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].franchise_id.as_deref(), Some("F01"));
        assert!(rows[1].franchise_id.is_none());
    }

    #[test]
    fn test_player_stats_isolate_bad_rosters() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeasonStore::open(temp_dir.path()).unwrap();
        let root = store.config().raw_api_root();
        let qb = || player("Joe Burrow", "QB", &["QB"], "24.5");
        for week in 1..=2 {
            let players = vec![qb(), player("Sam Runner", "RB", &["RB"], "8")];
            let doc = roster("Alpha", "Ann", week, players);
            write_json(&roster_path(&root, 2023, "423.l.1.t.1", week), &doc).unwrap();
        }
        let doubled = roster("Beta", "Bob", 1, vec![qb(), qb()]);
        write_json(&roster_path(&root, 2023, "423.l.1.t.2", 1), &doubled).unwrap();
        fs::write(roster_path(&root, 2023, "423.l.1.t.2", 2), "{ not json").unwrap();

        let build = build_player_stats(&store, 2023).unwrap();
        assert_eq!(build.weeks_parsed, vec![1, 2]);
        assert_eq!(build.files_failed.len(), 1);
        assert_eq!(build.files_failed[0].0, "423_l_1_t_2");
        assert_eq!(build.files_failed[0].1, 2);
        assert_eq!(build.rows, 5);

        let rows = store.load_player_stats(2023).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].week, 1);
        assert_eq!(rows[0].team, "Alpha");
        assert_eq!(rows[0].actual_points, 24.5);
        assert_eq!(rows.iter().filter(|r| r.team == "Beta").count(), 1);
    }

    #[test]
    fn test_player_stats_without_rosters_write_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeasonStore::open(temp_dir.path()).unwrap();
        seed(&store);
        let build = build_player_stats(&store, 2023).unwrap();
        assert!(build.path.is_none());
        assert!(!store.config().player_stats_path(2023).exists());
    }

    #[test]
    fn test_build_all_requires_raw_dumps() {
        let temp_dir = TempDir::new().unwrap();
        let store = SeasonStore::open(temp_dir.path()).unwrap();
        assert!(build_all(&store, &FranchiseRegistry::new()).is_err());

        seed(&store);
        fs::create_dir_all(store.config().raw_api_root().join("2024")).unwrap();
        let builds = build_all(&store, &FranchiseRegistry::new()).unwrap();
        assert_eq!(builds.len(), 2);
        assert!(builds[1].path.is_none());
        assert_eq!(store.seasons_available().unwrap(), vec![2023]);
    }
}
