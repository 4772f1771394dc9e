//! Franchise Registry - Maps team and manager names to stable franchise ids
//!
//! Team names change from season to season and managers occasionally hand a
//! team over. The registry reads `franchise_map.csv` and stamps each score
//! row with the franchise it belongs to, then offers fuzzy suggestions for
//! whatever is left unmatched.

pub mod registry;
pub mod suggest;
pub mod types;

pub use registry::FranchiseRegistry;
pub use suggest::{similarity, DEFAULT_SUGGESTION_THRESHOLD};
pub use types::{FranchiseRecord, FranchiseSuggestion, RegistryError, Result};
