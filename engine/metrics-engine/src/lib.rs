//! # Metrics Engine
//!
//! Derived league tables computed from per-week score rows.
//!
//! Every metric is a pure function of the rows it is given:
//!
//! - **Standings**: wins, losses, ties and scoring over completed weeks
//! - **Expected wins / luck**: all-play win fractions against actual results
//! - **Consistency**: `1 / (1 + stdev)` of weekly points
//! - **Power score**: weighted blend of normalized components, 0–100
//! - **Legacy**: recency-weighted power score per franchise across seasons
//!
//! [`MetricsEngine`] reads the season files through `season-store` and
//! serves each table by season; `metrics-cli` prints them.

pub mod cli;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod expected_wins;
pub mod legacy;
pub mod payouts;
pub mod players;
pub mod power;
pub mod records;
pub mod standings;
pub mod summary;


// Re-export main types for easy usage
pub use config::{MetricsConfig, PowerWeights};
pub use consistency::{compute_consistency, ConsistencyBand, ConsistencyEntry};
pub use engine::MetricsEngine;
pub use error::{MetricsError, Result};
pub use expected_wins::{compute_expected_wins, compute_luck, ExpectedWins, LuckEntry, TieRule};
pub use legacy::{compute_legacy, FranchiseIdentity, FranchiseLegacyEntry};
pub use power::{min_max_normalize, power_scores, rank_descending};
pub use standings::{completed_rows, compute_standings, TeamRecord};
pub use summary::{summarize_all, summarize_season, TeamSeasonSummary};
