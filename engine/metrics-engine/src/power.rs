//! # Power Score
//!
//! Weighted blend of min–max normalized season components, scaled to 0–100.

use crate::config::PowerWeights;
use serde::Serialize;

/// Min–max normalization to [0, 1].
///
/// A constant column (max == min) maps every value to 0.5.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|v| if span > 0.0 && span.is_finite() { (v - min) / span } else { 0.5 })
        .collect()
}

/// Raw power score inputs of one team
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerInputs {
    pub avg_points: f64,
    pub win_pct: f64,
    pub consistency: f64,
    pub luck: f64,
}

/// Power scores for a season's teams, in input order
pub fn power_scores(inputs: &[PowerInputs], weights: &PowerWeights) -> Vec<f64> {
    let column = |f: fn(&PowerInputs) -> f64| -> Vec<f64> {
        min_max_normalize(&inputs.iter().map(f).collect::<Vec<_>>())
    };
    let avg_points = column(|i| i.avg_points);
    let win_pct = column(|i| i.win_pct);
    let consistency = column(|i| i.consistency);
    let luck = column(|i| i.luck);

    let w = weights.normalized();
    (0..inputs.len())
        .map(|i| {
            100.0
                * (w.avg_points * avg_points[i]
                    + w.win_pct * win_pct[i]
                    + w.consistency * consistency[i]
                    + w.luck * luck[i])
        })
        .collect()
}

/// 1-based descending rank of each score.
///
/// Stable: equal scores keep their input order, and every rank is distinct.
pub fn rank_descending(scores: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ranks = vec![0; scores.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position as u32 + 1;
    }
    ranks
}
