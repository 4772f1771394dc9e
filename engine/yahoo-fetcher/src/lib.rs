//! Yahoo Fantasy ingestion
//!
//! Downloads raw league dumps (standings, teams, weekly scoreboards and team
//! rosters) into `<data_dir>/raw/api/<season>/`, checks the dump tree for
//! gaps, and turns them into franchise-stamped `scores_<season>.csv` tables
//! and `player_stats_<season>.csv` tables.

pub mod builder;
pub mod config;
pub mod fetcher;
pub mod raw;
pub mod retry;
pub mod roster;
pub mod scoreboard;
pub mod validate;

pub use builder::{
    build_all, build_player_stats, build_season, PlayerStatsBuild, SeasonBuild,
};
pub use config::{FetcherConfig, RetryConfig, YahooConfig};
pub use fetcher::{FetchReport, YahooFetcher};
pub use roster::{parse_roster, parse_roster_file, team_keys};
pub use scoreboard::{parse_scoreboard, parse_scoreboard_file};
pub use validate::{validate_raw, validate_season, SeasonValidation};
