//! Player scoring leaders from the per-season player stat tables

use season_store::PlayerStatRow;
use serde::Serialize;
use std::collections::HashMap;

/// Season total of one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTotal {
    pub player_name: String,
    pub position: String,
    /// Fantasy team that rostered the player most recently
    pub team: String,
    pub weeks: u32,
    pub total_points: f64,
}

/// One player's single-week result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerWeek {
    pub week: u32,
    pub player_name: String,
    pub position: String,
    pub team: String,
    pub manager: String,
    pub actual_points: f64,
    pub projected_points: Option<f64>,
}

/// Top-N players by summed actual points, grouped by (name, position)
pub fn season_leaders(rows: &[PlayerStatRow], top_n: usize) -> Vec<PlayerTotal> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut totals: Vec<(PlayerTotal, u32)> = Vec::new();
    for row in rows {
        let key = (row.player_name.as_str(), row.position.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            totals.push((
                PlayerTotal {
                    player_name: row.player_name.clone(),
                    position: row.position.clone(),
                    team: row.team.clone(),
                    weeks: 0,
                    total_points: 0.0,
                },
                row.week,
            ));
            totals.len() - 1
        });
        let (total, latest_week) = &mut totals[slot];
        total.weeks += 1;
        total.total_points += row.actual_points;
        if row.week >= *latest_week {
            *latest_week = row.week;
            total.team = row.team.clone();
        }
    }

    let mut leaders: Vec<PlayerTotal> = totals.into_iter().map(|(total, _)| total).collect();
    leaders.sort_by(|a, b| b.total_points.total_cmp(&a.total_points));
    leaders.truncate(top_n);
    leaders
}

/// Top-N single-week player performances
pub fn top_single_weeks(rows: &[PlayerStatRow], top_n: usize) -> Vec<PlayerWeek> {
    let mut sorted: Vec<&PlayerStatRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.actual_points.total_cmp(&a.actual_points));
    sorted
        .into_iter()
        .take(top_n)
        .map(|row| PlayerWeek {
            week: row.week,
            player_name: row.player_name.clone(),
            position: row.position.clone(),
            team: row.team.clone(),
            manager: row.manager.clone(),
            actual_points: row.actual_points,
            projected_points: row.projected_points,
        })
        .collect()
}
