//! Fuzzy matching of unmatched names against the franchise map

use crate::types::FranchiseRecord;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use strsim::{normalized_damerau_levenshtein, sorensen_dice};

/// Minimum confidence for a suggestion to be reported
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.55;

/// Similarity of two names in [0, 1].
///
/// The best of three measures on the lower-cased names: Damerau-Levenshtein
/// ratio (typos and swapped letters), Sorensen-Dice over bigrams (reordered
/// words) and the skim score of the shorter name inside the longer one
/// (added prefixes or suffixes).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let edit = normalized_damerau_levenshtein(&a, &b);
    let dice = sorensen_dice(&a, &b);
    edit.max(dice).max(containment(&a, &b)).clamp(0.0, 1.0)
}

/// Skim score of the shorter name inside the longer one, relative to the
/// longer name's score against itself
fn containment(a: &str, b: &str) -> f64 {
    let (long, short) = if a.chars().count() >= b.chars().count() { (a, b) } else { (b, a) };
    let matcher = SkimMatcherV2::default();
    let ideal = match matcher.fuzzy_match(long, long) {
        Some(score) if score > 0 => score as f64,
        _ => return 0.0,
    };
    let score = matcher.fuzzy_match(long, short).unwrap_or(0) as f64;
    score / ideal
}

/// Best franchise for a (team, manager) pair and its similarity.
///
/// Manager names are compared against `manager_name`, team names against
/// each alias; the higher of the two counts. Ties keep the earlier record.
pub(crate) fn best_match<'r>(
    records: &'r [FranchiseRecord],
    team: &str,
    manager: &str,
) -> Option<(&'r str, f64)> {
    let mut best: Option<(&'r str, f64)> = None;
    for record in records {
        let name_score = similarity(manager, &record.manager_name);
        let alias_score =
            record.aliases.iter().map(|alias| similarity(team, alias)).fold(0.0, f64::max);
        let total = name_score.max(alias_score);
        if total > best.map_or(0.0, |(_, s)| s) {
            best = Some((record.franchise_id.as_str(), total));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("Alpha Dogs", "alpha dogs "), 1.0);
        assert_eq!(similarity("", "alpha"), 0.0);
        assert_eq!(similarity("qqqq", "alpha dogs"), 0.0);

        let partial = similarity("The Alpha Dogs", "Alpha Dogs");
        assert!(partial > 0.0 && partial < 1.0, "got {partial}");
    }

    #[test]
    fn test_similarity_prefers_closer_names() {
        let close = similarity("Alpha Dogs 2", "Alpha Dogs");
        let far = similarity("A Big Long Team Name With Dogs", "Alpha Dogs");
        assert!(close > far, "close {close} far {far}");
    }

    #[test]
    fn test_similarity_tolerates_typos() {
        assert!(similarity("Alpha Dgos", "Alpha Dogs") >= 0.8);
        assert!(similarity("Jonh", "John") >= 0.7);
        assert!(similarity("Beta Blokers", "Beta Blockers") >= 0.9);
        assert!(similarity("Jonh", "Zed") < DEFAULT_SUGGESTION_THRESHOLD);
    }

    #[test]
    fn test_best_match_uses_manager_or_alias() {
        let records = vec![
            FranchiseRecord::new("F01", "Ann", &["Alpha Dogs"]),
            FranchiseRecord::new("F02", "Bob", &["Beta Blockers"]),
        ];
        assert_eq!(best_match(&records, "Unrelated", "Bob").map(|(id, _)| id), Some("F02"));
        assert_eq!(best_match(&records, "Alpha Dogs", "Zed").map(|(id, _)| id), Some("F01"));
        assert_eq!(best_match(&records, "qqqq", "zzzz"), None);
    }
}
