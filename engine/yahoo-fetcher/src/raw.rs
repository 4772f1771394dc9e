//! Layout of the raw API dump tree: `<root>/<season>/scoreboard_week_<n>.json`,
//! `standings.json`, `teams.json` and `rosters/<team_key>/week_<n>.json`.

use crate::scoreboard::scoreboard_week;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const STANDINGS_FILE: &str = "standings.json";
pub const TEAMS_FILE: &str = "teams.json";
pub const ROSTERS_DIR: &str = "rosters";

pub fn season_dir(root: &Path, season: i32) -> PathBuf {
    root.join(season.to_string())
}

pub fn scoreboard_path(root: &Path, season: i32, week: u32) -> PathBuf {
    season_dir(root, season).join(format!("scoreboard_week_{week}.json"))
}

/// Roster directory of one team; dots in the team key become underscores
pub fn roster_dir(root: &Path, season: i32, team_key: &str) -> PathBuf {
    season_dir(root, season).join(ROSTERS_DIR).join(team_key.replace('.', "_"))
}

pub fn roster_path(root: &Path, season: i32, team_key: &str, week: u32) -> PathBuf {
    roster_dir(root, season, team_key).join(format!("week_{week}.json"))
}

/// Week number encoded in a `week_<n>.json` roster file name
pub fn roster_week(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.strip_prefix("week_")?.parse::<u32>().ok().filter(|w| *w > 0)
}

/// Roster dumps of one season directory as (team dir, week, path), ordered
/// by week then team. A season without a rosters directory has none.
pub fn roster_files(dir: &Path) -> Result<Vec<(String, u32, PathBuf)>> {
    let rosters = dir.join(ROSTERS_DIR);
    if !rosters.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&rosters)
        .with_context(|| format!("Failed to list {}", rosters.display()))?
    {
        let team_dir = entry?.path();
        if !team_dir.is_dir() {
            continue;
        }
        let team = team_dir.file_name().map(|n| n.to_string_lossy().into_owned());
        let team = team.unwrap_or_default();
        for file in fs::read_dir(&team_dir)? {
            let path = file?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(week) = roster_week(&path) {
                    files.push((team.clone(), week, path));
                }
            }
        }
    }
    files.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
    Ok(files)
}

/// Season directories under the root, ascending. A missing root is empty.
pub fn season_dirs(root: &Path) -> Result<Vec<(i32, PathBuf)>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Raw API directory {} does not exist", root.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", root.display())),
    };

    let mut seasons = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if let Ok(season) = name.parse::<i32>() {
            seasons.push((season, path));
        }
    }
    seasons.sort_by_key(|(season, _)| *season);
    Ok(seasons)
}

/// Scoreboard dumps of one season directory, ordered by week
pub fn scoreboard_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut files: Vec<(u32, PathBuf)> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| scoreboard_week(&path).map(|week| (week, path)))
        .collect();
    files.sort_by_key(|(week, _)| *week);
    Ok(files)
}

/// Write a JSON document, creating parent directories
pub fn write_json(path: &Path, document: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(document)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
