//! # Standings
//!
//! Win/loss records and scoring totals per team over completed weeks.

use season_store::ScoreRow;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Rows belonging to completed weeks.
///
/// A (season, week) is completed only when every row in it has
/// `points_for > 0`; any other week is dropped entirely.
pub fn completed_rows(rows: &[ScoreRow]) -> Vec<&ScoreRow> {
    let incomplete: HashSet<(i32, u32)> =
        rows.iter().filter(|r| r.points_for <= 0.0).map(|r| (r.season, r.week)).collect();
    rows.iter().filter(|r| !incomplete.contains(&(r.season, r.week))).collect()
}

/// Groups rows by team, keeping teams in first-appearance order
pub(crate) fn group_by_team<'a>(rows: &[&'a ScoreRow]) -> Vec<(&'a str, Vec<&'a ScoreRow>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ScoreRow>)> = Vec::new();
    for row in rows {
        let slot = *index.entry(row.team.as_str()).or_insert_with(|| {
            groups.push((row.team.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }
    groups
}

/// Division that yields 0 for an empty denominator
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Record of one team over the completed weeks of a season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRecord {
    pub team: String,
    pub manager: String,
    pub franchise_id: Option<String>,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for_total: f64,
    pub points_against_total: f64,
    pub avg_points: f64,
    pub avg_points_against: f64,
    pub avg_margin: f64,
    pub win_pct: f64,
}

impl TeamRecord {
    fn from_rows(team: &str, rows: &[&ScoreRow]) -> Self {
        let mut record = TeamRecord {
            team: team.to_string(),
            manager: rows
                .iter()
                .map(|r| r.manager.as_str())
                .find(|m| !m.is_empty())
                .unwrap_or_default()
                .to_string(),
            franchise_id: rows.iter().find_map(|r| r.franchise_id.clone()),
            games: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            points_for_total: 0.0,
            points_against_total: 0.0,
            avg_points: 0.0,
            avg_points_against: 0.0,
            avg_margin: 0.0,
            win_pct: 0.0,
        };

        for row in rows {
            record.games += 1;
            record.points_for_total += row.points_for;
            record.points_against_total += row.points_against;
            if row.points_for > row.points_against {
                record.wins += 1;
            } else if row.points_for < row.points_against {
                record.losses += 1;
            } else {
                record.ties += 1;
            }
        }

        let games = f64::from(record.games);
        record.avg_points = ratio(record.points_for_total, games);
        record.avg_points_against = ratio(record.points_against_total, games);
        record.avg_margin = ratio(record.points_for_total - record.points_against_total, games);
        record.win_pct = ratio(f64::from(record.wins), games);
        record
    }
}

/// Standings for the rows of one season, in first-appearance team order
pub fn compute_standings(rows: &[ScoreRow]) -> Vec<TeamRecord> {
    let completed = completed_rows(rows);
    group_by_team(&completed)
        .into_iter()
        .map(|(team, team_rows)| TeamRecord::from_rows(team, &team_rows))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(week: u32, a: &str, pa: f64, b: &str, pb: f64) -> [ScoreRow; 2] {
        [
            ScoreRow::new(2024, week, a, format!("{a} mgr"), b, pa, pb),
            ScoreRow::new(2024, week, b, format!("{b} mgr"), a, pb, pa),
        ]
    }

    #[test]
    fn test_standings_count_wins_losses_and_ties() {
        let mut rows = Vec::new();
        rows.extend(game(1, "A", 100.0, "B", 90.0));
        rows.extend(game(2, "A", 80.0, "B", 80.0));
        rows.extend(game(3, "B", 120.0, "A", 60.0));

        let standings = compute_standings(&rows);
        assert_eq!(standings.len(), 2);
        let a = &standings[0];
        assert_eq!(a.team, "A");
        assert_eq!(a.manager, "A mgr");
        assert_eq!((a.games, a.wins, a.losses, a.ties), (3, 1, 1, 1));
        assert_eq!(a.points_for_total, 240.0);
        assert_eq!(a.avg_points, 80.0);
        assert!((a.win_pct - 1.0 / 3.0).abs() < 1e-12);
        assert!((a.avg_margin - (240.0 - 290.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_incomplete_weeks_are_excluded() {
        let mut rows = Vec::new();
        rows.extend(game(1, "A", 100.0, "B", 90.0));
        rows.extend(game(2, "A", 0.0, "B", 0.0));
        rows.extend(game(3, "A", 95.0, "B", 0.0));

        assert_eq!(completed_rows(&rows).len(), 2);
        let standings = compute_standings(&rows);
        assert!(standings.iter().all(|t| t.games == 1));
    }

    #[test]
    fn test_no_completed_weeks_gives_empty_table() {
        let rows: Vec<ScoreRow> = game(1, "A", 0.0, "B", 0.0).into();
        assert!(compute_standings(&rows).is_empty());
    }

    #[test]
    fn test_franchise_id_is_carried() {
        let mut rows: Vec<ScoreRow> = game(1, "A", 100.0, "B", 90.0).into();
        rows[0].franchise_id = Some("F01".to_string());
        let standings = compute_standings(&rows);
        assert_eq!(standings[0].franchise_id.as_deref(), Some("F01"));
        assert!(standings[1].franchise_id.is_none());
    }
}
