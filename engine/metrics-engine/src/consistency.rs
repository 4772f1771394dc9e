//! # Consistency
//!
//! Week-to-week scoring stability: `1 / (1 + stdev)` of weekly points.

use crate::standings::{completed_rows, group_by_team, ratio};
use season_store::ScoreRow;
use serde::Serialize;
use std::fmt;

/// Qualitative consistency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsistencyBand {
    VeryConsistent,
    Steady,
    BoomOrBust,
    Chaotic,
}

impl ConsistencyBand {
    /// Band for a consistency score
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            ConsistencyBand::VeryConsistent
        } else if score > 0.7 {
            ConsistencyBand::Steady
        } else if score > 0.5 {
            ConsistencyBand::BoomOrBust
        } else {
            ConsistencyBand::Chaotic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsistencyBand::VeryConsistent => "very consistent",
            ConsistencyBand::Steady => "steady",
            ConsistencyBand::BoomOrBust => "boom-or-bust",
            ConsistencyBand::Chaotic => "chaotic",
        }
    }
}

impl fmt::Display for ConsistencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sample standard deviation (n − 1); 0 for fewer than two values
pub fn sample_stdev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// `1 / (1 + stdev)`, always in (0, 1]
pub fn consistency_score(points: &[f64]) -> f64 {
    1.0 / (1.0 + sample_stdev(points))
}

/// Consistency of one team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyEntry {
    pub team: String,
    pub weeks: u32,
    pub mean_points: f64,
    pub stdev: f64,
    pub consistency_score: f64,
    pub band: ConsistencyBand,
}

/// Consistency per team over completed weeks, in first-appearance order
pub fn compute_consistency(rows: &[ScoreRow]) -> Vec<ConsistencyEntry> {
    let completed = completed_rows(rows);
    group_by_team(&completed)
        .into_iter()
        .map(|(team, team_rows)| {
            let points: Vec<f64> = team_rows.iter().map(|r| r.points_for).collect();
            let stdev = sample_stdev(&points);
            let score = 1.0 / (1.0 + stdev);
            ConsistencyEntry {
                team: team.to_string(),
                weeks: points.len() as u32,
                mean_points: ratio(points.iter().sum(), points.len() as f64),
                stdev,
                consistency_score: score,
                band: ConsistencyBand::from_score(score),
            }
        })
        .collect()
}
