//! Yahoo team and roster JSON → player stat rows.
//!
//! A roster dump is `fantasy_content.team`: the team meta list followed by a
//! `roster` object whose `players` collection holds one `player` list per
//! rostered player. Points are read from `player_points` and
//! `player_projected_points` when the dump carries them.

use crate::scoreboard::{flatten_into, indexed, number, text};
use anyhow::{Context, Result};
use season_store::PlayerStatRow;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Team identity shared by every player row of a roster
#[derive(Debug, Clone, Default, PartialEq)]
struct RosterTeam {
    name: Option<String>,
    manager: String,
    manager_image: Option<String>,
    manager_felo: Option<String>,
    logo_url: Option<String>,
}

fn flatten(value: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    flatten_into(value, &mut fields);
    fields
}

/// Team keys listed in a league `teams` document, in index order
pub fn team_keys(document: &Value) -> Result<Vec<String>> {
    let league = document
        .pointer("/fantasy_content/league")
        .and_then(Value::as_array)
        .context("teams document has no fantasy_content.league list")?;
    let teams = league
        .iter()
        .find_map(|entry| entry.get("teams"))
        .and_then(Value::as_object)
        .context("league has no teams collection")?;

    Ok(indexed(teams)
        .into_iter()
        .filter_map(|entry| entry.get("team"))
        .filter_map(|team| flatten(team).get("team_key").and_then(text))
        .collect())
}

fn parse_team_meta(meta: &Value) -> RosterTeam {
    let fields = flatten(meta);
    let manager = fields
        .get("managers")
        .and_then(|m| m.get(0))
        .and_then(|m| m.get("manager"));
    RosterTeam {
        name: fields.get("name").and_then(text),
        manager: manager.and_then(|m| m.get("nickname")).and_then(text).unwrap_or_default(),
        manager_image: manager.and_then(|m| m.get("image_url")).and_then(text),
        manager_felo: manager.and_then(|m| m.get("felo_tier")).and_then(text),
        logo_url: fields
            .get("team_logos")
            .and_then(|l| l.get(0))
            .and_then(|l| l.get("team_logo"))
            .and_then(|l| l.get("url"))
            .and_then(text),
    }
}

fn player_name(fields: &Map<String, Value>) -> Option<String> {
    let name = fields.get("name")?;
    match name {
        Value::Object(parts) => ["full", "first", "last"]
            .iter()
            .find_map(|key| parts.get(*key).and_then(text)),
        other => text(other),
    }
}

/// `[{"position": "QB"}, ..]` or `["QB", ..]` joined with ", "
fn eligible_positions(fields: &Map<String, Value>) -> String {
    let Some(Value::Array(positions)) = fields.get("eligible_positions") else {
        return String::new();
    };
    positions
        .iter()
        .filter_map(|p| p.get("position").and_then(text).or_else(|| text(p)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn selected_position(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("selected_position")? {
        slot @ Value::String(_) => text(slot),
        other => flatten(other).get("position").and_then(text),
    }
}

fn player_row(
    season: i32,
    week: u32,
    team_name: &str,
    team: &RosterTeam,
    player: &Value,
) -> Option<PlayerStatRow> {
    let fields = flatten(player);
    let total = |key: &str| fields.get(key).and_then(|p| p.get("total")).and_then(number);

    Some(PlayerStatRow {
        season,
        team: team_name.to_string(),
        manager: team.manager.clone(),
        player_name: player_name(&fields)?,
        position: selected_position(&fields)
            .or_else(|| fields.get("display_position").and_then(text))
            .unwrap_or_else(|| "Unknown".to_string()),
        eligible_positions: eligible_positions(&fields),
        week,
        logo_url: team.logo_url.clone(),
        manager_image: team.manager_image.clone(),
        manager_felo: team.manager_felo.clone(),
        actual_points: total("player_points").unwrap_or(0.0),
        projected_points: total("player_projected_points"),
    })
}

/// Parse one roster document into player rows.
///
/// `fallback_team` names the team when the dump carries no team meta.
/// Players without a name are skipped.
pub fn parse_roster(
    document: &Value,
    season: i32,
    week: u32,
    fallback_team: &str,
) -> Result<Vec<PlayerStatRow>> {
    let team = document
        .pointer("/fantasy_content/team")
        .and_then(Value::as_array)
        .context("roster has no fantasy_content.team list")?;

    let meta = team.first().map(parse_team_meta).unwrap_or_default();
    let team_name = meta.name.clone().unwrap_or_else(|| fallback_team.to_string());
    let roster = team
        .iter()
        .find_map(|entry| entry.get("roster"))
        .context("team has no roster")?;

    let Some(players) = roster
        .pointer("/0/players")
        .or_else(|| roster.get("players"))
        .and_then(Value::as_object)
    else {
        warn!("Season {} week {}: roster of {} lists no players", season, week, team_name);
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for entry in indexed(players) {
        let Some(player) = entry.get("player") else { continue };
        match player_row(season, week, &team_name, &meta, player) {
            Some(row) => rows.push(row),
            None => warn!("Season {} week {}: unnamed player on {}", season, week, team_name),
        }
    }
    debug!("Parsed {} players for {} in week {}", rows.len(), team_name, week);
    Ok(rows)
}

/// Read and parse a `rosters/<team>/week_<n>.json` dump
pub fn parse_roster_file(
    path: &Path,
    season: i32,
    week: u32,
    fallback_team: &str,
) -> Result<Vec<PlayerStatRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    parse_roster(&document, season, week, fallback_team)
        .with_context(|| format!("Malformed roster {}", path.display()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scoreboard::tests::team;
    use serde_json::json;

    pub(crate) fn player(name: &str, slot: &str, eligible: &[&str], points: &str) -> Value {
        let display = eligible.first().copied().unwrap_or("");
        let eligible: Vec<Value> = eligible.iter().map(|p| json!({ "position": p })).collect();
        json!({
            "player": [
                [
                    { "player_key": format!("423.p.{}", name.len()) },
                    { "name": { "full": name, "first": "", "last": "" } },
                    { "display_position": display },
                    { "eligible_positions": eligible }
                ],
                { "selected_position": [ { "coverage_type": "week" }, { "position": slot } ] },
                { "player_points": { "coverage_type": "week", "total": points } },
                { "player_projected_points": { "coverage_type": "week", "total": "10.5" } }
            ]
        })
    }

    pub(crate) fn roster(team_name: &str, manager: &str, week: u32, players: Vec<Value>) -> Value {
        let mut collection = Map::new();
        let count = players.len();
        for (i, p) in players.into_iter().enumerate() {
            collection.insert(i.to_string(), p);
        }
        collection.insert("count".to_string(), json!(count));
        let meta = team(team_name, manager, "0", None)["team"][0].clone();
        json!({
            "fantasy_content": {
                "team": [
                    meta,
                    { "roster": { "coverage_type": "week", "week": week.to_string(), "0": { "players": collection } } }
                ]
            }
        })
    }

    pub(crate) fn teams(names: &[&str]) -> Value {
        let mut collection = Map::new();
        for (i, name) in names.iter().enumerate() {
            collection.insert(i.to_string(), team(name, "m", "0", None));
        }
        collection.insert("count".to_string(), json!(names.len()));
        json!({
            "fantasy_content": {
                "league": [ { "league_key": "423.l.1", "season": "2023" }, { "teams": collection } ]
            }
        })
    }

    #[test]
    fn test_team_keys_in_index_order() {
        let keys = team_keys(&teams(&["Alpha", "Beta"])).unwrap();
        assert_eq!(keys, vec!["423.l.1.t.Alpha", "423.l.1.t.Beta"]);
        assert!(team_keys(&json!({ "fantasy_content": {} })).is_err());
    }

    #[test]
    fn test_roster_players_become_rows() {
        let doc = roster(
            "Alpha",
            "Ann",
            3,
            vec![
                player("Joe Burrow", "QB", &["QB"], "24.56"),
                player("Ja'Marr Chase", "BN", &["WR", "W/R/T"], "n/a"),
            ],
        );
        let rows = parse_roster(&doc, 2023, 3, "423_l_1_t_1").unwrap();
        assert_eq!(rows.len(), 2);

        let qb = &rows[0];
        assert_eq!((qb.season, qb.week), (2023, 3));
        assert_eq!(qb.team, "Alpha");
        assert_eq!(qb.manager, "Ann");
        assert_eq!(qb.player_name, "Joe Burrow");
        assert_eq!(qb.position, "QB");
        assert_eq!(qb.actual_points, 24.56);
        assert_eq!(qb.projected_points, Some(10.5));
        assert_eq!(qb.manager_felo.as_deref(), Some("gold"));
        assert_eq!(qb.logo_url.as_deref(), Some("https://img/Alpha.png"));

        let bench = &rows[1];
        assert_eq!(bench.position, "BN");
        assert_eq!(bench.eligible_positions, "WR, W/R/T");
        assert_eq!(bench.actual_points, 0.0);
    }

    #[test]
    fn test_missing_meta_falls_back_to_team_dir() {
        let doc = json!({
            "fantasy_content": {
                "team": [
                    [],
                    { "roster": { "0": { "players": {
                        "0": { "player": [ [ { "name": { "full": "Sam Runner" } } ] ] },
                        "1": { "player": [ [ { "player_key": "x" } ] ] },
                        "count": 2
                    } } } }
                ]
            }
        });
        let rows = parse_roster(&doc, 2019, 1, "390_l_6_t_5").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "390_l_6_t_5");
        assert_eq!(rows[0].position, "Unknown");
        assert!(rows[0].projected_points.is_none());

        assert!(parse_roster(&json!({}), 2019, 1, "t").is_err());
    }
}
