//! Yahoo scoreboard JSON → score rows.
//!
//! The v2 API wraps collections as objects keyed `"0"`, `"1"`, … plus a
//! `"count"` entry, and spreads a team's attributes over a list of single-key
//! objects. Parsing walks `fantasy_content.league[0]` for the league meta and
//! `league[1].scoreboard["0"].matchups` for the games.

use anyhow::{bail, Context, Result};
use season_store::ScoreRow;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// One side of a matchup
#[derive(Debug, Clone, PartialEq)]
struct TeamLine {
    name: String,
    manager: String,
    felo_tier: Option<String>,
    logo_url: Option<String>,
    points: f64,
    projected: Option<f64>,
}

/// Numbers arrive as either JSON numbers or strings
pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Entries of a `{"0": .., "1": .., "count": n}` collection in index order
pub(crate) fn indexed(collection: &Map<String, Value>) -> Vec<&Value> {
    let mut entries: Vec<(usize, &Value)> = collection
        .iter()
        .filter_map(|(key, value)| key.parse::<usize>().ok().map(|i| (i, value)))
        .collect();
    entries.sort_by_key(|(i, _)| *i);
    entries.into_iter().map(|(_, value)| value).collect()
}

/// Merge the nested list-of-objects team layout into one flat object
pub(crate) fn flatten_into(value: &Value, out: &mut Map<String, Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten_into(item, out)),
        Value::Object(fields) => {
            for (key, field) in fields {
                out.insert(key.clone(), field.clone());
            }
        }
        _ => {}
    }
}

fn parse_team(team: &Value) -> TeamLine {
    let mut fields = Map::new();
    flatten_into(team, &mut fields);

    let manager = fields
        .get("managers")
        .and_then(|m| m.get(0))
        .and_then(|m| m.get("manager"));
    let total = |key: &str| fields.get(key).and_then(|p| p.get("total")).and_then(number);

    TeamLine {
        name: fields.get("name").and_then(text).unwrap_or_else(|| "Unknown".to_string()),
        manager: manager.and_then(|m| m.get("nickname")).and_then(text).unwrap_or_default(),
        felo_tier: manager.and_then(|m| m.get("felo_tier")).and_then(text),
        logo_url: fields
            .get("team_logos")
            .and_then(|l| l.get(0))
            .and_then(|l| l.get("team_logo"))
            .and_then(|l| l.get("url"))
            .and_then(text),
        points: total("team_points").unwrap_or(0.0),
        projected: total("team_projected_points"),
    }
}

fn row(season: i32, week: u32, team: &TeamLine, opponent: &TeamLine) -> ScoreRow {
    let mut row = ScoreRow::new(
        season,
        week,
        &team.name,
        &team.manager,
        &opponent.name,
        team.points,
        opponent.points,
    );
    row.felo_tier = team.felo_tier.clone();
    row.logo_url = team.logo_url.clone();
    match team.projected {
        Some(projected) => row.with_projection(projected),
        None => row,
    }
}

/// Parse one scoreboard document into mirrored score rows.
///
/// Matchups without exactly two teams are skipped.
pub fn parse_scoreboard(document: &Value) -> Result<Vec<ScoreRow>> {
    let league = document
        .pointer("/fantasy_content/league")
        .and_then(Value::as_array)
        .context("scoreboard has no fantasy_content.league list")?;
    if league.len() < 2 {
        bail!("scoreboard league list has {} entries, expected 2", league.len());
    }

    let season = league[0]
        .get("season")
        .and_then(number)
        .context("league meta has no season")? as i32;
    let scoreboard = league[1].get("scoreboard").context("league has no scoreboard")?;
    let scoreboard_week = scoreboard.get("week").and_then(number);

    let Some(matchups) = scoreboard
        .pointer("/0/matchups")
        .or_else(|| scoreboard.get("matchups"))
        .and_then(Value::as_object)
    else {
        warn!("Season {} scoreboard has no matchups", season);
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for entry in indexed(matchups) {
        let Some(matchup) = entry.get("matchup") else { continue };
        let Some(week) = matchup.get("week").and_then(number).or(scoreboard_week) else {
            warn!("Season {} matchup without a week, skipping", season);
            continue;
        };
        let week = week as u32;

        let teams: Vec<TeamLine> = matchup
            .pointer("/0/teams")
            .or_else(|| matchup.get("teams"))
            .and_then(Value::as_object)
            .map(|teams| {
                indexed(teams).into_iter().filter_map(|t| t.get("team")).map(parse_team).collect()
            })
            .unwrap_or_default();

        if teams.len() != 2 {
            warn!(
                "Season {} week {}: matchup has {} teams, skipping",
                season,
                week,
                teams.len()
            );
            continue;
        }
        rows.push(row(season, week, &teams[0], &teams[1]));
        rows.push(row(season, week, &teams[1], &teams[0]));
    }

    debug!("Parsed {} score rows for season {}", rows.len(), season);
    Ok(rows)
}

/// Read and parse a `scoreboard_week_<n>.json` dump
pub fn parse_scoreboard_file(path: &Path) -> Result<Vec<ScoreRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    parse_scoreboard(&document).with_context(|| format!("Malformed scoreboard {}", path.display()))
}

/// Week number encoded in a `scoreboard_week_<n>.json` file name
pub fn scoreboard_week(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.strip_prefix("scoreboard_week_")?.parse().ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn team(name: &str, manager: &str, points: &str, projected: Option<&str>) -> Value {
        let mut stats = json!({ "team_points": { "coverage_type": "week", "total": points } });
        if let Some(projected) = projected {
            stats["team_projected_points"] = json!({ "total": projected });
        }
        json!({
            "team": [
                [
                    { "team_key": format!("423.l.1.t.{name}") },
                    { "name": name },
                    [],
                    { "team_logos": [ { "team_logo": { "size": "large", "url": format!("https://img/{name}.png") } } ] },
                    { "managers": [ { "manager": { "nickname": manager, "felo_tier": "gold" } } ] }
                ],
                stats
            ]
        })
    }

    pub(crate) fn scoreboard(season: &str, week: u32, matchups: Vec<Vec<Value>>) -> Value {
        let mut collection = Map::new();
        for (i, teams) in matchups.into_iter().enumerate() {
            let mut team_map = Map::new();
            let count = teams.len();
            for (j, t) in teams.into_iter().enumerate() {
                team_map.insert(j.to_string(), t);
            }
            team_map.insert("count".to_string(), json!(count));
            collection.insert(
                i.to_string(),
                json!({ "matchup": { "week": week.to_string(), "is_playoffs": "0", "0": { "teams": team_map } } }),
            );
        }
        json!({
            "fantasy_content": {
                "league": [
                    { "league_key": "423.l.1", "season": season },
                    { "scoreboard": { "week": week, "0": { "matchups": collection } } }
                ]
            }
        })
    }

    #[test]
    fn test_matchup_produces_mirrored_rows() {
        let doc = scoreboard(
            "2023",
            4,
            vec![vec![
                team("Alpha", "Ann", "112.40", Some("101.5")),
                team("Beta", "Bob", "98.10", None),
            ]],
        );
        let rows = parse_scoreboard(&doc).unwrap();
        assert_eq!(rows.len(), 2);

        let (a, b) = (&rows[0], &rows[1]);
        assert_eq!((a.season, a.week), (2023, 4));
        assert_eq!(a.team, "Alpha");
        assert_eq!(a.manager, "Ann");
        assert_eq!(a.opponent, "Beta");
        assert_eq!(a.points_for, 112.4);
        assert_eq!(a.points_against, 98.1);
        assert_eq!(a.projected_points, Some(101.5));
        assert_eq!(a.felo_tier.as_deref(), Some("gold"));
        assert_eq!(a.logo_url.as_deref(), Some("https://img/Alpha.png"));

        assert_eq!(b.team, "Beta");
        assert_eq!(b.points_for, a.points_against);
        assert_eq!(b.points_against, a.points_for);
        assert!(b.projected_points.is_none());
    }

    #[test]
    fn test_odd_matchups_skipped_and_bad_totals_zeroed() {
        let doc = scoreboard(
            "2023",
            1,
            vec![
                vec![team("Solo", "Sam", "80", None)],
                vec![team("Alpha", "Ann", "n/a", None), team("Beta", "Bob", "90", None)],
            ],
        );
        let rows = parse_scoreboard(&doc).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].points_for, 0.0);
        assert_eq!(rows[1].points_against, 0.0);
    }

    #[test]
    fn test_matchups_keep_numeric_order() {
        let matchups = (0..11)
            .map(|i| {
                vec![
                    team(&format!("Home{i}"), "h", "1", None),
                    team(&format!("Away{i}"), "a", "2", None),
                ]
            })
            .collect();
        let rows = parse_scoreboard(&scoreboard("2023", 1, matchups)).unwrap();
        assert_eq!(rows[4].team, "Home2");
        assert_eq!(rows[20].team, "Home10");
    }

    #[test]
    fn test_missing_league_meta_is_an_error() {
        assert!(parse_scoreboard(&json!({ "fantasy_content": {} })).is_err());
        let no_matchups = json!({
            "fantasy_content": { "league": [ { "season": "2023" }, { "scoreboard": {} } ] }
        });
        assert!(parse_scoreboard(&no_matchups).unwrap().is_empty());
    }

    #[test]
    fn test_week_from_file_name() {
        assert_eq!(scoreboard_week(Path::new("raw/2023/scoreboard_week_12.json")), Some(12));
        assert_eq!(scoreboard_week(Path::new("raw/2023/standings.json")), None);
    }
}
