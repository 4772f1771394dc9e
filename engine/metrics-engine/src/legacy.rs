//! # Franchise Legacy
//!
//! Recency-weighted average of power scores across seasons. A season `k`
//! years before the newest one carries weight `decay^k`.

use crate::summary::TeamSeasonSummary;
use serde::Serialize;
use std::collections::HashMap;

/// Identity a legacy entry is keyed on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FranchiseIdentity {
    /// Stable id stamped at ingestion
    Franchise { franchise_id: String },
    /// Rows without a franchise id fall back to the team/manager pair
    TeamManager { team: String, manager: String },
}

impl FranchiseIdentity {
    pub fn of(summary: &TeamSeasonSummary) -> Self {
        match &summary.franchise_id {
            Some(id) => FranchiseIdentity::Franchise { franchise_id: id.clone() },
            None => FranchiseIdentity::TeamManager {
                team: summary.team.clone(),
                manager: summary.manager.clone(),
            },
        }
    }

    /// Display key: the franchise id, or "team (manager)"
    pub fn key(&self) -> String {
        match self {
            FranchiseIdentity::Franchise { franchise_id } => franchise_id.clone(),
            FranchiseIdentity::TeamManager { team, manager } if manager.is_empty() => team.clone(),
            FranchiseIdentity::TeamManager { team, manager } => format!("{team} ({manager})"),
        }
    }
}

/// Legacy standing of one franchise across all seasons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FranchiseLegacyEntry {
    pub identity: FranchiseIdentity,
    /// Team name in the newest contributing season
    pub latest_team: String,
    /// Manager in the newest contributing season
    pub latest_manager: String,
    pub seasons: u32,
    pub first_season: i32,
    pub last_season: i32,
    pub legacy_index: f64,
    pub rank: u32,
}

/// Weight of `season` relative to `most_recent`
pub fn season_weight(season: i32, most_recent: i32, decay: f64) -> f64 {
    decay.powi(most_recent - season)
}

struct Accumulator<'a> {
    weighted_sum: f64,
    weight_total: f64,
    seasons: u32,
    first_season: i32,
    latest: &'a TeamSeasonSummary,
}

/// Legacy table sorted by rank.
///
/// The newest season in `summaries` anchors the weights. Ties keep the
/// order in which franchises first appear in `summaries`.
pub fn compute_legacy(summaries: &[TeamSeasonSummary], decay: f64) -> Vec<FranchiseLegacyEntry> {
    let Some(most_recent) = summaries.iter().map(|s| s.season).max() else {
        return Vec::new();
    };

    let mut index: HashMap<FranchiseIdentity, usize> = HashMap::new();
    let mut groups: Vec<(FranchiseIdentity, Accumulator)> = Vec::new();
    for summary in summaries {
        let identity = FranchiseIdentity::of(summary);
        let weight = season_weight(summary.season, most_recent, decay);
        let slot = match index.get(&identity) {
            Some(slot) => *slot,
            None => {
                index.insert(identity.clone(), groups.len());
                groups.push((
                    identity,
                    Accumulator {
                        weighted_sum: 0.0,
                        weight_total: 0.0,
                        seasons: 0,
                        first_season: summary.season,
                        latest: summary,
                    },
                ));
                groups.len() - 1
            }
        };

        let acc = &mut groups[slot].1;
        acc.weighted_sum += weight * summary.power_score;
        acc.weight_total += weight;
        acc.seasons += 1;
        acc.first_season = acc.first_season.min(summary.season);
        if summary.season >= acc.latest.season {
            acc.latest = summary;
        }
    }

    let mut entries: Vec<FranchiseLegacyEntry> = groups
        .into_iter()
        .map(|(identity, acc)| FranchiseLegacyEntry {
            identity,
            latest_team: acc.latest.team.clone(),
            latest_manager: acc.latest.manager.clone(),
            seasons: acc.seasons,
            first_season: acc.first_season,
            last_season: acc.latest.season,
            legacy_index: if acc.weight_total > 0.0 {
                acc.weighted_sum / acc.weight_total
            } else {
                0.0
            },
            rank: 0,
        })
        .collect();

    entries.sort_by(|a, b| b.legacy_index.total_cmp(&a.legacy_index));
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position as u32 + 1;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyBand;

    fn summary(season: i32, team: &str, franchise: Option<&str>, power: f64) -> TeamSeasonSummary {
        TeamSeasonSummary {
            season,
            team: team.to_string(),
            manager: format!("{team} mgr"),
            franchise_id: franchise.map(str::to_string),
            games: 13,
            wins: 7,
            losses: 6,
            ties: 0,
            points_for_total: 1300.0,
            points_against_total: 1250.0,
            avg_points: 100.0,
            avg_margin: 3.8,
            win_pct: 7.0 / 13.0,
            expected_wins: 6.5,
            expected_win_pct: 0.5,
            luck_index: 0.5,
            luck_pct: 0.04,
            consistency_score: 0.05,
            consistency_band: ConsistencyBand::Chaotic,
            power_score: power,
            power_rank: 1,
        }
    }

    #[test]
    fn test_single_season_collapses_to_power_score() {
        let entries = compute_legacy(
            &[summary(2024, "A", None, 71.25), summary(2024, "B", None, 40.0)],
            0.9,
        );
        assert_eq!(entries[0].legacy_index, 71.25);
        assert_eq!(entries[1].legacy_index, 40.0);
        assert_eq!(entries[0].seasons, 1);
    }

    #[test]
    fn test_recency_weighting_uses_franchise_id_across_renames() {
        let entries = compute_legacy(
            &[
                summary(2022, "Old Name", Some("F01"), 100.0),
                summary(2023, "New Name", Some("F01"), 0.0),
                summary(2023, "Other", None, 50.0),
            ],
            0.5,
        );
        let f01 = entries
            .iter()
            .find(|e| e.identity == FranchiseIdentity::Franchise { franchise_id: "F01".into() })
            .unwrap();
        assert_eq!(f01.seasons, 2);
        assert_eq!(f01.latest_team, "New Name");
        assert_eq!((f01.first_season, f01.last_season), (2022, 2023));
        // (0.5 * 100 + 1.0 * 0) / 1.5
        assert!((f01.legacy_index - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(entries[0].identity.key(), "Other (Other mgr)");
        assert_eq!(entries[0].rank, 1);
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let entries = compute_legacy(
            &[summary(2024, "B", None, 50.0), summary(2024, "A", None, 50.0)],
            0.9,
        );
        assert_eq!(entries[0].latest_team, "B");
        assert_eq!(entries[1].rank, 2);
        assert!(compute_legacy(&[], 0.9).is_empty());
    }
}
