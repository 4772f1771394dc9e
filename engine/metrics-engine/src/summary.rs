//! # Team Season Summary
//!
//! Joins standings, expected wins, consistency and power into one row per
//! (season, team).

use crate::config::MetricsConfig;
use crate::consistency::{compute_consistency, ConsistencyBand};
use crate::error::{MetricsError, Result};
use crate::expected_wins::compute_expected_wins;
use crate::power::{power_scores, rank_descending, PowerInputs};
use crate::standings::compute_standings;
use season_store::ScoreRow;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Every derived metric of one team in one season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonSummary {
    pub season: i32,
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
    pub avg_margin: f64,
    pub win_pct: f64,
    pub expected_wins: f64,
    pub expected_win_pct: f64,
    pub luck_index: f64,
    pub luck_pct: f64,
    pub consistency_score: f64,
    pub consistency_band: ConsistencyBand,
    pub power_score: f64,
    pub power_rank: u32,
}

impl TeamSeasonSummary {
    /// Record as "W-L", or "W-L-T" when ties occurred
    pub fn record_string(&self) -> String {
        if self.ties > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }
}

/// Rows of one season, cloned out of a multi-season set
pub fn season_rows(rows: &[ScoreRow], season: i32) -> Vec<ScoreRow> {
    rows.iter().filter(|r| r.season == season).cloned().collect()
}

/// Distinct seasons present in the rows, ascending
pub fn seasons_in(rows: &[ScoreRow]) -> Vec<i32> {
    rows.iter().map(|r| r.season).collect::<BTreeSet<_>>().into_iter().collect()
}

/// Summaries of one season in first-appearance team order.
///
/// Rows of other seasons are ignored. A season with rows but no completed
/// week yields an empty table.
pub fn summarize_season(
    rows: &[ScoreRow],
    season: i32,
    config: &MetricsConfig,
) -> Result<Vec<TeamSeasonSummary>> {
    let rows = season_rows(rows, season);
    if rows.is_empty() {
        return Err(MetricsError::no_data(format!("no rows for season {season}")));
    }

    let standings = compute_standings(&rows);
    if standings.is_empty() {
        warn!("Season {} has no completed weeks", season);
        return Ok(Vec::new());
    }

    let expected: HashMap<String, (f64, f64)> =
        compute_expected_wins(&rows, config.expected_wins.tie_rule)
            .into_iter()
            .map(|e| (e.team, (e.expected_wins, e.expected_win_pct)))
            .collect();
    let consistency: HashMap<String, (f64, ConsistencyBand)> = compute_consistency(&rows)
        .into_iter()
        .map(|c| (c.team, (c.consistency_score, c.band)))
        .collect();

    let mut summaries: Vec<TeamSeasonSummary> = standings
        .into_iter()
        .map(|record| {
            let (expected_wins, expected_win_pct) =
                expected.get(&record.team).copied().unwrap_or((0.0, 0.0));
            let (consistency_score, consistency_band) = consistency
                .get(&record.team)
                .copied()
                .unwrap_or((1.0, ConsistencyBand::VeryConsistent));
            TeamSeasonSummary {
                season,
                luck_index: f64::from(record.wins) - expected_wins,
                luck_pct: record.win_pct - expected_win_pct,
                team: record.team,
                manager: record.manager,
                franchise_id: record.franchise_id,
                games: record.games,
                wins: record.wins,
                losses: record.losses,
                ties: record.ties,
                points_for_total: record.points_for_total,
                points_against_total: record.points_against_total,
                avg_points: record.avg_points,
                avg_margin: record.avg_margin,
                win_pct: record.win_pct,
                expected_wins,
                expected_win_pct,
                consistency_score,
                consistency_band,
                power_score: 0.0,
                power_rank: 0,
            }
        })
        .collect();

    let inputs: Vec<PowerInputs> = summaries
        .iter()
        .map(|s| PowerInputs {
            avg_points: s.avg_points,
            win_pct: s.win_pct,
            consistency: s.consistency_score,
            luck: s.luck_index,
        })
        .collect();
    let scores = power_scores(&inputs, &config.power);
    let ranks = rank_descending(&scores);
    for ((summary, score), rank) in summaries.iter_mut().zip(scores).zip(ranks) {
        summary.power_score = score;
        summary.power_rank = rank;
    }

    debug!("Summarized {} teams for season {}", summaries.len(), season);
    Ok(summaries)
}

/// Summaries of every season present, seasons ascending.
///
/// A season that fails to summarize is logged and skipped.
pub fn summarize_all(rows: &[ScoreRow], config: &MetricsConfig) -> Vec<TeamSeasonSummary> {
    let mut all = Vec::new();
    for season in seasons_in(rows) {
        match summarize_season(rows, season, config) {
            Ok(summaries) => all.extend(summaries),
            Err(e) => warn!("Skipping season {}: {}", season, e),
        }
    }
    all
}

/// Summaries sorted by power rank
pub fn by_power_rank(summaries: &[TeamSeasonSummary]) -> Vec<&TeamSeasonSummary> {
    let mut sorted: Vec<&TeamSeasonSummary> = summaries.iter().collect();
    sorted.sort_by_key(|s| (s.season, s.power_rank));
    sorted
}
