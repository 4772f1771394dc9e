//! # Season Store
//!
//! CSV-backed storage for league season tables.
//!
//! ## Layout
//!
//! - `scores_<season>.csv`: one row per team per week
//! - `player_stats_<season>.csv`: one row per rostered player per week
//! - `combined_seasons_scores.csv`: every season concatenated
//!
//! ## Usage
//!
//! ```rust,no_run
//! use season_store::SeasonStore;
//!
//! fn main() -> season_store::Result<()> {
//!     let store = SeasonStore::open("./data")?;
//!     let load = store.load_all_seasons()?;
//!     println!("{} rows from seasons {:?}", load.rows.len(), load.loaded);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod schema;
pub mod season;

pub use cache::TableCache;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use schema::{ensure_unique_keys, pairing_issues, PairingIssue, PlayerStatRow, ScoreRow};
pub use season::{read_player_stats, read_scores, BackfillReport, MultiSeasonLoad, SeasonStore};
