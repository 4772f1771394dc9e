//! # Expected Wins and Luck
//!
//! All-play expected wins: each week a team is credited with the fraction
//! of the other teams it outscored. Luck is actual wins minus that
//! expectation.

use crate::error::MetricsError;
use crate::standings::{completed_rows, compute_standings, group_by_team, ratio};
use season_store::ScoreRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Credit given when two teams post the same weekly score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// A tied opponent counts as not beaten
    #[default]
    Strict,
    /// A tied opponent counts as half a win
    HalfCredit,
}

impl fmt::Display for TieRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieRule::Strict => write!(f, "strict"),
            TieRule::HalfCredit => write!(f, "half_credit"),
        }
    }
}

impl FromStr for TieRule {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(TieRule::Strict),
            "half_credit" | "half" => Ok(TieRule::HalfCredit),
            other => Err(MetricsError::InvalidConfig(format!(
                "unknown tie rule '{other}' (expected 'strict' or 'half_credit')"
            ))),
        }
    }
}

/// All-play win fraction of every score against the others in the same week.
///
/// A week with fewer than two teams credits nothing.
pub fn all_play_fractions(scores: &[f64], rule: TieRule) -> Vec<f64> {
    let n = scores.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let opponents = (n - 1) as f64;
    scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let credit: f64 = scores
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| {
                    if score > other {
                        1.0
                    } else if score == other && rule == TieRule::HalfCredit {
                        0.5
                    } else {
                        0.0
                    }
                })
                .sum();
            credit / opponents
        })
        .collect()
}

/// Expected-wins totals of one team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedWins {
    pub team: String,
    pub games: u32,
    pub expected_wins: f64,
    pub expected_win_pct: f64,
}

/// Expected wins per team over completed weeks, in first-appearance order
pub fn compute_expected_wins(rows: &[ScoreRow], rule: TieRule) -> Vec<ExpectedWins> {
    let completed = completed_rows(rows);

    let mut weeks: BTreeMap<(i32, u32), Vec<&ScoreRow>> = BTreeMap::new();
    for row in &completed {
        weeks.entry((row.season, row.week)).or_default().push(row);
    }

    let mut credit: HashMap<&str, f64> = HashMap::new();
    for week_rows in weeks.values() {
        let scores: Vec<f64> = week_rows.iter().map(|r| r.points_for).collect();
        for (row, fraction) in week_rows.iter().zip(all_play_fractions(&scores, rule)) {
            *credit.entry(row.team.as_str()).or_insert(0.0) += fraction;
        }
    }

    group_by_team(&completed)
        .into_iter()
        .map(|(team, team_rows)| {
            let games = team_rows.len() as u32;
            let expected_wins = credit.get(team).copied().unwrap_or(0.0);
            ExpectedWins {
                team: team.to_string(),
                games,
                expected_wins,
                expected_win_pct: ratio(expected_wins, f64::from(games)),
            }
        })
        .collect()
}

/// Luck of one team: actual results against the all-play expectation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LuckEntry {
    pub team: String,
    pub manager: String,
    pub games: u32,
    pub wins: u32,
    pub expected_wins: f64,
    pub luck_index: f64,
    pub win_pct: f64,
    pub expected_win_pct: f64,
    pub luck_pct: f64,
}

/// Luck table for the rows of one season, in first-appearance order
pub fn compute_luck(rows: &[ScoreRow], rule: TieRule) -> Vec<LuckEntry> {
    let expected: HashMap<String, ExpectedWins> = compute_expected_wins(rows, rule)
        .into_iter()
        .map(|e| (e.team.clone(), e))
        .collect();

    compute_standings(rows)
        .into_iter()
        .map(|record| {
            let (expected_wins, expected_win_pct) = expected
                .get(&record.team)
                .map(|e| (e.expected_wins, e.expected_win_pct))
                .unwrap_or((0.0, 0.0));
            LuckEntry {
                luck_index: f64::from(record.wins) - expected_wins,
                luck_pct: record.win_pct - expected_win_pct,
                team: record.team,
                manager: record.manager,
                games: record.games,
                wins: record.wins,
                expected_wins,
                win_pct: record.win_pct,
                expected_win_pct,
            }
        })
        .collect()
}
