//! # Table Schemas
//!
//! Row types for the season score and player stat tables plus the
//! header/cell parsing shared by every loader.

use crate::error::{Result, StoreError};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Columns every score table must carry
pub const REQUIRED_SCORE_COLUMNS: &[&str] = &["team", "points_for", "points_against", "week"];

/// Columns every player stat table must carry
pub const REQUIRED_PLAYER_COLUMNS: &[&str] = &["team", "player_name", "week", "actual_points"];

/// One team's result for one week of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub season: i32,
    pub week: u32,
    pub team: String,
    pub manager: String,
    pub felo_tier: Option<String>,
    pub logo_url: Option<String>,
    pub opponent: String,
    pub points_for: f64,
    pub points_against: f64,
    pub projected_points: Option<f64>,
    /// Stable franchise identity stamped at ingestion time
    pub franchise_id: Option<String>,
}

impl ScoreRow {
    /// Create a row with the required fields; optional columns start empty
    pub fn new(
        season: i32,
        week: u32,
        team: impl Into<String>,
        manager: impl Into<String>,
        opponent: impl Into<String>,
        points_for: f64,
        points_against: f64,
    ) -> Self {
        Self {
            season,
            week,
            team: team.into(),
            manager: manager.into(),
            felo_tier: None,
            logo_url: None,
            opponent: opponent.into(),
            points_for,
            points_against,
            projected_points: None,
            franchise_id: None,
        }
    }

    /// Builder-style projection setter
    pub fn with_projection(mut self, projected_points: f64) -> Self {
        self.projected_points = Some(projected_points);
        self
    }

    /// Builder-style franchise setter
    pub fn with_franchise(mut self, franchise_id: impl Into<String>) -> Self {
        self.franchise_id = Some(franchise_id.into());
        self
    }

    /// points_for − points_against
    pub fn margin(&self) -> f64 {
        self.points_for - self.points_against
    }
}

/// One rostered player's result for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRow {
    pub season: i32,
    pub team: String,
    pub manager: String,
    pub player_name: String,
    pub position: String,
    pub eligible_positions: String,
    pub week: u32,
    pub logo_url: Option<String>,
    pub manager_image: Option<String>,
    pub manager_felo: Option<String>,
    pub actual_points: f64,
    pub projected_points: Option<f64>,
}

/// A pairing problem found in a season table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingIssue {
    pub season: i32,
    pub week: u32,
    pub team: String,
    pub detail: String,
}

/// Check that every row has a mirrored opponent row in the same week.
///
/// Rows without an opponent name are reported too; the metrics engine does
/// not depend on pairing, so callers log these rather than fail.
pub fn pairing_issues(rows: &[ScoreRow]) -> Vec<PairingIssue> {
    let index: HashMap<(i32, u32, &str), &ScoreRow> =
        rows.iter().map(|r| ((r.season, r.week, r.team.as_str()), r)).collect();

    let mut issues = Vec::new();
    for row in rows {
        if row.opponent.is_empty() {
            issues.push(PairingIssue {
                season: row.season,
                week: row.week,
                team: row.team.clone(),
                detail: "no opponent recorded".to_string(),
            });
            continue;
        }
        match index.get(&(row.season, row.week, row.opponent.as_str())) {
            None => issues.push(PairingIssue {
                season: row.season,
                week: row.week,
                team: row.team.clone(),
                detail: format!("opponent '{}' has no row", row.opponent),
            }),
            Some(other) => {
                if other.opponent != row.team
                    || !approx_eq(other.points_for, row.points_against)
                    || !approx_eq(other.points_against, row.points_for)
                {
                    issues.push(PairingIssue {
                        season: row.season,
                        week: row.week,
                        team: row.team.clone(),
                        detail: format!("row for '{}' does not mirror this one", row.opponent),
                    });
                }
            }
        }
    }
    issues
}

/// Reject tables where (season, week, team) is not unique
pub fn ensure_unique_keys(rows: &[ScoreRow]) -> Result<()> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert((row.season, row.week, row.team.as_str())) {
            return Err(StoreError::DuplicateKey {
                season: row.season,
                week: row.week,
                team: row.team.clone(),
            });
        }
    }
    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Column-name → position lookup built from a CSV header.
///
/// Header names are trimmed and lower-cased so `" Team"` and `"team"` match.
pub(crate) struct HeaderIndex {
    path: PathBuf,
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub(crate) fn new(path: &Path, headers: &StringRecord) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Self { path: path.to_path_buf(), columns }
    }

    pub(crate) fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Fail with every missing column named, in the order given
    pub(crate) fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> =
            required.iter().filter(|c| !self.has(c)).map(|c| c.to_string()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MissingColumns { path: self.path.clone(), missing })
        }
    }

    /// Trimmed cell text; `None` when the column is absent or the cell blank
    pub(crate) fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let idx = *self.columns.get(column)?;
        record.get(idx).map(str::trim).filter(|v| !v.is_empty() && !is_null_marker(v))
    }

    pub(crate) fn text(&self, record: &StringRecord, column: &str) -> String {
        self.cell(record, column).unwrap_or_default().to_string()
    }

    pub(crate) fn optional_text(&self, record: &StringRecord, column: &str) -> Option<String> {
        self.cell(record, column).map(str::to_string)
    }

    pub(crate) fn required_text(
        &self,
        record: &StringRecord,
        line: usize,
        column: &str,
    ) -> Result<String> {
        self.cell(record, column)
            .map(str::to_string)
            .ok_or_else(|| self.invalid(line, column, ""))
    }

    pub(crate) fn required_f64(
        &self,
        record: &StringRecord,
        line: usize,
        column: &str,
    ) -> Result<f64> {
        let raw = self.cell(record, column).ok_or_else(|| self.invalid(line, column, ""))?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(line, column, raw))
    }

    /// Optional numeric column: unparseable cells become `None`
    pub(crate) fn optional_f64(&self, record: &StringRecord, column: &str) -> Option<f64> {
        self.cell(record, column).and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite())
    }

    pub(crate) fn required_int(
        &self,
        record: &StringRecord,
        line: usize,
        column: &str,
    ) -> Result<i64> {
        let raw = self.cell(record, column).ok_or_else(|| self.invalid(line, column, ""))?;
        parse_int(raw).ok_or_else(|| self.invalid(line, column, raw))
    }

    pub(crate) fn optional_int(&self, record: &StringRecord, column: &str) -> Option<i64> {
        self.cell(record, column).and_then(parse_int)
    }

    pub(crate) fn invalid(&self, line: usize, column: &str, value: &str) -> StoreError {
        StoreError::InvalidValue {
            path: self.path.clone(),
            line,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Accept `7` as well as `7.0` (spreadsheets and dataframes write both)
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

fn is_null_marker(v: &str) -> bool {
    matches!(v, "NaN" | "nan" | "None" | "null" | "<NA>")
}

/// Season of a record. `season_hint` (the season in the file name) fills a
/// blank cell and must agree with a filled one.
fn parse_season(
    header: &HeaderIndex,
    record: &StringRecord,
    line: usize,
    season_hint: Option<i32>,
) -> Result<i32> {
    let raw = header.cell(record, "season").unwrap_or_default().to_string();
    let season = match header.optional_int(record, "season") {
        Some(s) => i32::try_from(s).map_err(|_| header.invalid(line, "season", &raw))?,
        None => return season_hint.ok_or_else(|| header.invalid(line, "season", &raw)),
    };
    match season_hint {
        Some(hint) if hint != season => Err(header.invalid(line, "season", &raw)),
        _ => Ok(season),
    }
}

/// Weeks are 1-based
fn parse_week(header: &HeaderIndex, record: &StringRecord, line: usize) -> Result<u32> {
    let week = header.required_int(record, line, "week")?;
    u32::try_from(week)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| header.invalid(line, "week", &week.to_string()))
}

/// Parse one score record; `season_hint` fills a missing season cell
pub(crate) fn parse_score_record(
    header: &HeaderIndex,
    record: &StringRecord,
    line: usize,
    season_hint: Option<i32>,
) -> Result<ScoreRow> {
    let season = parse_season(header, record, line, season_hint)?;
    let week = parse_week(header, record, line)?;

    let points_for = non_negative(header, record, line, "points_for")?;
    let points_against = non_negative(header, record, line, "points_against")?;

    Ok(ScoreRow {
        season,
        week,
        team: header.required_text(record, line, "team")?,
        manager: header.text(record, "manager"),
        felo_tier: header.optional_text(record, "felo_tier"),
        logo_url: header.optional_text(record, "logo_url"),
        opponent: header.text(record, "opponent"),
        points_for,
        points_against,
        projected_points: header.optional_f64(record, "projected_points").filter(|p| *p >= 0.0),
        franchise_id: header.optional_text(record, "franchise_id"),
    })
}

fn non_negative(
    header: &HeaderIndex,
    record: &StringRecord,
    line: usize,
    column: &str,
) -> Result<f64> {
    let value = header.required_f64(record, line, column)?;
    if value < 0.0 {
        return Err(header.invalid(line, column, &value.to_string()));
    }
    Ok(value)
}

/// Parse one player stat record
pub(crate) fn parse_player_record(
    header: &HeaderIndex,
    record: &StringRecord,
    line: usize,
    season_hint: Option<i32>,
) -> Result<PlayerStatRow> {
    let season = parse_season(header, record, line, season_hint)?;
    let week = parse_week(header, record, line)?;

    Ok(PlayerStatRow {
        season,
        team: header.required_text(record, line, "team")?,
        manager: header.text(record, "manager"),
        player_name: header.required_text(record, line, "player_name")?,
        position: header
            .optional_text(record, "selected_position")
            .or_else(|| header.optional_text(record, "position"))
            .unwrap_or_else(|| "Unknown".to_string()),
        eligible_positions: header.text(record, "eligible_positions"),
        week,
        logo_url: header.optional_text(record, "logo_url"),
        manager_image: header.optional_text(record, "manager_image"),
        manager_felo: header.optional_text(record, "manager_felo"),
        actual_points: header.required_f64(record, line, "actual_points")?,
        projected_points: header.optional_f64(record, "projected_points"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> HeaderIndex {
        HeaderIndex::new(Path::new("scores_2024.csv"), &StringRecord::from(cols.to_vec()))
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let h = header(&["season", "team", "manager"]);
        let err = h.require(REQUIRED_SCORE_COLUMNS).unwrap_err();
        match err {
            StoreError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["points_for", "points_against", "week"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_names_are_normalized() {
        let h = header(&[" Team ", "WEEK", "Points_For", "points_against"]);
        assert!(h.require(REQUIRED_SCORE_COLUMNS).is_ok());
    }

    #[test]
    fn test_parse_score_record_uses_season_hint_and_float_weeks() {
        let h = header(&["week", "team", "manager", "opponent", "points_for", "points_against"]);
        let record = StringRecord::from(vec!["3.0", "Alpha", "Ann", "Beta", "101.5", "99.25"]);
        let row = parse_score_record(&h, &record, 2, Some(2021)).unwrap();
        assert_eq!(row.season, 2021);
        assert_eq!(row.week, 3);
        assert_eq!(row.points_for, 101.5);
        assert!(row.projected_points.is_none());
    }

    #[test]
    fn test_season_cell_must_match_file_season() {
        let h = header(&["season", "week", "team", "points_for", "points_against"]);
        let record = StringRecord::from(vec!["2023", "1", "Alpha", "80", "90"]);
        match parse_score_record(&h, &record, 4, Some(2024)).unwrap_err() {
            StoreError::InvalidValue { line, column, value, .. } => {
                assert_eq!(line, 4);
                assert_eq!(column, "season");
                assert_eq!(value, "2023");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(parse_score_record(&h, &record, 4, None).unwrap().season, 2023);
        assert_eq!(parse_score_record(&h, &record, 4, Some(2023)).unwrap().season, 2023);
    }

    #[test]
    fn test_player_rows_reject_week_zero() {
        let h = header(&["season", "week", "team", "player_name", "actual_points"]);
        let record = StringRecord::from(vec!["2024", "0", "Alpha", "Sam Runner", "12.5"]);
        match parse_player_record(&h, &record, 7, Some(2024)).unwrap_err() {
            StoreError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 7);
                assert_eq!(column, "week");
            }
            other => panic!("unexpected error: {other}"),
        }

        let record = StringRecord::from(vec!["2024", "1", "Alpha", "Sam Runner", "12.5"]);
        assert_eq!(parse_player_record(&h, &record, 7, Some(2024)).unwrap().week, 1);
    }

    #[test]
    fn test_blank_points_are_rejected_not_defaulted() {
        let h = header(&["season", "week", "team", "points_for", "points_against"]);
        let record = StringRecord::from(vec!["2024", "1", "Alpha", "", "90"]);
        let err = parse_score_record(&h, &record, 5, None).unwrap_err();
        match err {
            StoreError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 5);
                assert_eq!(column, "points_for");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_projection_becomes_none() {
        let h = header(&[
            "season",
            "week",
            "team",
            "points_for",
            "points_against",
            "projected_points",
        ]);
        let record = StringRecord::from(vec!["2024", "1", "Alpha", "80", "90", "n/a"]);
        let row = parse_score_record(&h, &record, 2, None).unwrap();
        assert!(row.projected_points.is_none());
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let rows = vec![
            ScoreRow::new(2024, 1, "Alpha", "Ann", "Beta", 100.0, 90.0),
            ScoreRow::new(2024, 1, "Alpha", "Ann", "Gamma", 100.0, 80.0),
        ];
        assert!(matches!(ensure_unique_keys(&rows), Err(StoreError::DuplicateKey { week: 1, .. })));
    }

    #[test]
    fn test_pairing_issues_detect_unmirrored_rows() {
        let rows = vec![
            ScoreRow::new(2024, 1, "Alpha", "Ann", "Beta", 100.0, 90.0),
            ScoreRow::new(2024, 1, "Beta", "Bob", "Alpha", 90.0, 100.0),
            ScoreRow::new(2024, 1, "Gamma", "Cy", "Delta", 80.0, 70.0),
            ScoreRow::new(2024, 1, "Delta", "Di", "Gamma", 75.0, 80.0),
        ];
        let issues = pairing_issues(&rows);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.team == "Gamma" || i.team == "Delta"));
    }
}
