//! Completeness report for the raw dump tree

use crate::raw::{scoreboard_files, season_dirs, ROSTERS_DIR, STANDINGS_FILE, TEAMS_FILE};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// What one season directory holds and what it lacks
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonValidation {
    pub season: i32,
    pub scoreboard_weeks: Vec<u32>,
    /// Roster week files per team directory
    pub roster_weeks: BTreeMap<String, usize>,
    pub issues: Vec<String>,
}

impl SeasonValidation {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

fn count_roster_weeks(dir: &Path) -> Result<usize> {
    Ok(fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("week_") && name.ends_with(".json")
        })
        .count())
}

/// Validate one season directory
pub fn validate_season(season: i32, dir: &Path) -> Result<SeasonValidation> {
    let mut issues = Vec::new();
    for file in [STANDINGS_FILE, TEAMS_FILE] {
        if !dir.join(file).exists() {
            issues.push(format!("missing {file}"));
        }
    }

    let scoreboard_weeks: Vec<u32> =
        scoreboard_files(dir)?.into_iter().map(|(week, _)| week).collect();
    match scoreboard_weeks.last() {
        None => issues.push("no scoreboard_week_*.json files found".to_string()),
        Some(&last) => {
            let gaps: Vec<String> = (1..=last)
                .filter(|week| !scoreboard_weeks.contains(week))
                .map(|week| week.to_string())
                .collect();
            if !gaps.is_empty() {
                issues.push(format!("missing scoreboard weeks: {}", gaps.join(", ")));
            }
        }
    }

    let mut roster_weeks = BTreeMap::new();
    let rosters = dir.join(ROSTERS_DIR);
    if rosters.is_dir() {
        for entry in fs::read_dir(&rosters)? {
            let path = entry?.path();
            if path.is_dir() {
                let team = path.file_name().map(|n| n.to_string_lossy().into_owned());
                roster_weeks.insert(team.unwrap_or_default(), count_roster_weeks(&path)?);
            }
        }
        if roster_weeks.values().all(|count| *count == 0) {
            issues.push("rosters directory has no week_*.json files".to_string());
        }
    } else {
        issues.push("missing rosters directory".to_string());
    }

    Ok(SeasonValidation { season, scoreboard_weeks, roster_weeks, issues })
}

/// Validate every season under the raw root
pub fn validate_raw(root: &Path) -> Result<Vec<SeasonValidation>> {
    season_dirs(root)?
        .into_iter()
        .map(|(season, dir)| validate_season(season, &dir))
        .collect()
}
