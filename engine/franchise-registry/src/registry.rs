use crate::suggest::best_match;
use crate::types::{FranchiseRecord, FranchiseSuggestion, RegistryError, Result};
use season_store::ScoreRow;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

const REQUIRED_COLUMNS: &[&str] = &["franchise_id", "manager_name", "aliases"];

/// Franchise Registry - Maps team/manager names to franchise ids
///
/// Resolution order for a (team, manager, season):
/// 1. exact case-insensitive manager name
/// 2. exact case-insensitive alias equal to the team name
/// 3. an alias containing the team name
///
/// Records whose year bounds exclude the season are skipped at every step.
#[derive(Debug, Default)]
pub struct FranchiseRegistry {
    records: Vec<FranchiseRecord>,
}

impl FranchiseRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from records already in memory
    pub fn from_records(records: Vec<FranchiseRecord>) -> Self {
        Self { records }
    }

    /// Load `franchise_map.csv`. A missing file yields an empty registry.
    pub fn load_from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        if !path.exists() {
            warn!("Franchise map {} not found; franchise ids will be empty", path.display());
            return Ok(Self::new());
        }
        info!("Loading franchise map from: {:?}", path);

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !columns.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RegistryError::MissingColumns { path: path.to_path_buf(), missing });
        }

        let mut records = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let cell = |name: &str| cell_text(&columns, &record, name);
            let year = |name: &str| -> Result<Option<i32>> {
                let raw = cell(name);
                if raw.is_empty() {
                    return Ok(None);
                }
                parse_year(&raw).map(Some).ok_or_else(|| RegistryError::InvalidYear {
                    path: path.to_path_buf(),
                    line,
                    column: name.to_string(),
                    value: raw.clone(),
                })
            };

            let franchise_id = cell("franchise_id");
            if franchise_id.is_empty() {
                debug!("Skipping franchise map line {} without franchise_id", line);
                continue;
            }
            records.push(FranchiseRecord {
                franchise_id,
                manager_name: cell("manager_name"),
                start_year: year("start_year")?,
                end_year: year("end_year")?,
                aliases: cell("aliases")
                    .split(';')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect(),
            });
        }

        info!("Loaded {} franchise mappings", records.len());
        Ok(Self { records })
    }

    /// All records in file order
    pub fn records(&self) -> &[FranchiseRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve the franchise for one team/manager in one season
    pub fn resolve(&self, team: &str, manager: &str, season: i32) -> Option<&str> {
        let manager = manager.trim().to_lowercase();
        let team = team.trim().to_lowercase();
        let active = || self.records.iter().filter(|r| r.active_in(season));

        if !manager.is_empty() {
            if let Some(r) = active().find(|r| r.manager_name.trim().to_lowercase() == manager) {
                return Some(r.franchise_id.as_str());
            }
        }
        if team.is_empty() {
            return None;
        }
        if let Some(r) =
            active().find(|r| r.aliases.iter().any(|a| a.to_lowercase() == team))
        {
            return Some(r.franchise_id.as_str());
        }
        active()
            .find(|r| r.aliases.iter().any(|a| a.to_lowercase().contains(&team)))
            .map(|r| r.franchise_id.as_str())
    }

    /// Stamp `franchise_id` onto rows that resolve; returns the number left unmatched.
    ///
    /// Rows that already carry a franchise id keep it.
    pub fn stamp_rows(&self, rows: &mut [ScoreRow]) -> usize {
        let mut unmatched = 0;
        for row in rows.iter_mut().filter(|r| r.franchise_id.is_none()) {
            match self.resolve(&row.team, &row.manager, row.season) {
                Some(id) => row.franchise_id = Some(id.to_string()),
                None => unmatched += 1,
            }
        }
        if unmatched > 0 && !self.is_empty() {
            warn!("{} row(s) did not match any franchise", unmatched);
        }
        unmatched
    }

    /// Distinct (team, manager) pairs with no franchise, in first-seen order
    pub fn unmatched_pairs(&self, rows: &[ScoreRow]) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        rows.iter()
            .filter(|r| {
                r.franchise_id.is_none() && self.resolve(&r.team, &r.manager, r.season).is_none()
            })
            .map(|r| (r.team.trim().to_string(), r.manager.trim().to_string()))
            .filter(|(team, manager)| !(team.is_empty() && manager.is_empty()))
            .filter(|pair| seen.insert(pair.clone()))
            .collect()
    }

    /// Fuzzy suggestions for the given pairs, sorted by confidence descending.
    ///
    /// A pair is reported only when its best similarity exceeds `threshold`.
    pub fn suggest<'a, I>(&self, pairs: I, threshold: f64) -> Vec<FranchiseSuggestion>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut suggestions: Vec<FranchiseSuggestion> = pairs
            .into_iter()
            .filter_map(|(team, manager)| {
                let (franchise, score) = best_match(&self.records, team, manager)?;
                (score > threshold).then(|| FranchiseSuggestion {
                    team: team.to_string(),
                    manager: manager.to_string(),
                    suggested_franchise: franchise.to_string(),
                    confidence: (score * 100.0).round() / 100.0,
                })
            })
            .collect();
        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        suggestions
    }
}

fn cell_text(columns: &HashMap<String, usize>, record: &csv::StringRecord, name: &str) -> String {
    columns.get(name).and_then(|idx| record.get(*idx)).map(str::trim).unwrap_or("").to_string()
}

fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(y) = raw.parse::<i32>() {
        return Some(y);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i32)
}
