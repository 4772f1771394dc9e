//! # Records, Awards and Comparisons
//!
//! League history tables built from score rows and season summaries.

use crate::error::{MetricsError, Result};
use crate::standings::{completed_rows, group_by_team, ratio};
use crate::summary::TeamSeasonSummary;
use season_store::ScoreRow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One team's result in one week, as shown in record tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamWeek {
    pub season: i32,
    pub week: u32,
    pub team: String,
    pub manager: String,
    pub opponent: String,
    pub points_for: f64,
    pub points_against: f64,
    pub margin: f64,
}

impl From<&ScoreRow> for TeamWeek {
    fn from(row: &ScoreRow) -> Self {
        Self {
            season: row.season,
            week: row.week,
            team: row.team.clone(),
            manager: row.manager.clone(),
            opponent: row.opponent.clone(),
            points_for: row.points_for,
            points_against: row.points_against,
            margin: row.margin(),
        }
    }
}

/// All-time record book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBook {
    pub highest_weeks: Vec<TeamWeek>,
    pub lowest_weeks: Vec<TeamWeek>,
    pub largest_margins: Vec<TeamWeek>,
}

fn top_by<F>(rows: &[&ScoreRow], n: usize, key: F, descending: bool) -> Vec<TeamWeek>
where
    F: Fn(&ScoreRow) -> f64,
{
    let mut sorted: Vec<&ScoreRow> = rows.to_vec();
    if descending {
        sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
    } else {
        sorted.sort_by(|a, b| key(a).total_cmp(&key(b)));
    }
    sorted.into_iter().take(n).map(TeamWeek::from).collect()
}

/// Top-N highest and lowest team weeks and largest winning margins.
///
/// Only completed weeks count; each blowout is listed once, from the
/// winner's side.
pub fn record_book(rows: &[ScoreRow], top_n: usize) -> RecordBook {
    let completed = completed_rows(rows);
    let winners: Vec<&ScoreRow> = completed.iter().copied().filter(|r| r.margin() > 0.0).collect();
    RecordBook {
        highest_weeks: top_by(&completed, top_n, |r| r.points_for, true),
        lowest_weeks: top_by(&completed, top_n, |r| r.points_for, false),
        largest_margins: top_by(&winners, top_n, ScoreRow::margin, true),
    }
}

/// Awards for one week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAwards {
    pub season: i32,
    pub week: u32,
    pub high_score: TeamWeek,
    pub low_score: TeamWeek,
    /// `None` when every game that week was a tie
    pub biggest_blowout: Option<TeamWeek>,
}

fn week_rows(rows: &[ScoreRow], season: i32, week: u32) -> Vec<&ScoreRow> {
    rows.iter().filter(|r| r.season == season && r.week == week).collect()
}

/// High score, low score and biggest blowout of a week.
///
/// The first row in input order wins ties.
pub fn weekly_awards(rows: &[ScoreRow], season: i32, week: u32) -> Result<WeeklyAwards> {
    let rows = week_rows(rows, season, week);
    let Some(first) = rows.first().copied() else {
        return Err(MetricsError::no_data(format!("no rows for season {season} week {week}")));
    };

    let (mut high, mut low) = (first, first);
    let mut blowout: Option<&ScoreRow> = None;
    for row in rows.iter().copied() {
        if row.points_for > high.points_for {
            high = row;
        }
        if row.points_for < low.points_for {
            low = row;
        }
        if row.margin() > 0.0 && blowout.map_or(true, |b| row.margin() > b.margin()) {
            blowout = Some(row);
        }
    }

    Ok(WeeklyAwards {
        season,
        week,
        high_score: high.into(),
        low_score: low.into(),
        biggest_blowout: blowout.map(TeamWeek::from),
    })
}

/// Rolling scoring average of one team ending at a week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumEntry {
    pub team: String,
    pub rolling_avg: f64,
    /// Weeks that fed the average (at most the window size)
    pub weeks: u32,
}

/// One week's games plus each team's scoring momentum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupSummary {
    pub season: i32,
    pub week: u32,
    /// Every row of the week, highest points_for first
    pub games: Vec<TeamWeek>,
    /// Teams playing that week, highest rolling average first
    pub momentum: Vec<MomentumEntry>,
}

/// Week table and `window`-week momentum ending at `week`.
///
/// Momentum is the mean points_for of a team's last `window` rows up to and
/// including `week`; a team with fewer rows averages what it has.
pub fn matchup_summary(
    rows: &[ScoreRow],
    season: i32,
    week: u32,
    window: usize,
) -> Result<MatchupSummary> {
    let this_week = week_rows(rows, season, week);
    if this_week.is_empty() {
        return Err(MetricsError::no_data(format!("no rows for season {season} week {week}")));
    }

    let mut games: Vec<TeamWeek> = this_week.iter().copied().map(TeamWeek::from).collect();
    games.sort_by(|a, b| b.points_for.total_cmp(&a.points_for));

    let history: Vec<&ScoreRow> =
        rows.iter().filter(|r| r.season == season && r.week <= week).collect();
    let by_team: HashMap<&str, Vec<&ScoreRow>> = group_by_team(&history).into_iter().collect();

    let window = window.max(1);
    let mut momentum: Vec<MomentumEntry> = this_week
        .iter()
        .map(|row| {
            let mut team_rows = by_team.get(row.team.as_str()).cloned().unwrap_or_default();
            team_rows.sort_by_key(|r| r.week);
            let recent = &team_rows[team_rows.len().saturating_sub(window)..];
            let total: f64 = recent.iter().map(|r| r.points_for).sum();
            MomentumEntry {
                team: row.team.clone(),
                rolling_avg: ratio(total, recent.len() as f64),
                weeks: recent.len() as u32,
            }
        })
        .collect();
    momentum.sort_by(|a, b| b.rolling_avg.total_cmp(&a.rolling_avg));

    Ok(MatchupSummary { season, week, games, momentum })
}

/// Season champion by wins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallOfFameEntry {
    pub season: i32,
    pub team: String,
    pub manager: String,
    pub wins: u32,
    pub points_for_total: f64,
}

/// Team with the most wins in each season; the first listed wins ties
pub fn hall_of_fame(summaries: &[TeamSeasonSummary]) -> Vec<HallOfFameEntry> {
    let mut best: BTreeMap<i32, &TeamSeasonSummary> = BTreeMap::new();
    for summary in summaries {
        best.entry(summary.season)
            .and_modify(|current| {
                if summary.wins > current.wins {
                    *current = summary;
                }
            })
            .or_insert(summary);
    }
    best.into_values()
        .map(|s| HallOfFameEntry {
            season: s.season,
            team: s.team.clone(),
            manager: s.manager.clone(),
            wins: s.wins,
            points_for_total: s.points_for_total,
        })
        .collect()
}

/// One team compared across two seasons (deltas are B − A)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonComparison {
    pub team: String,
    pub win_pct_a: f64,
    pub win_pct_b: f64,
    pub win_pct_delta: f64,
    pub points_a: f64,
    pub points_b: f64,
    pub points_delta: f64,
}

/// Teams present in both seasons, in season A order
pub fn compare_seasons(
    summaries: &[TeamSeasonSummary],
    season_a: i32,
    season_b: i32,
) -> Vec<SeasonComparison> {
    let in_b: HashMap<&str, &TeamSeasonSummary> = summaries
        .iter()
        .filter(|s| s.season == season_b)
        .map(|s| (s.team.as_str(), s))
        .collect();

    summaries
        .iter()
        .filter(|s| s.season == season_a)
        .filter_map(|a| {
            let b = in_b.get(a.team.as_str())?;
            Some(SeasonComparison {
                team: a.team.clone(),
                win_pct_a: a.win_pct,
                win_pct_b: b.win_pct,
                win_pct_delta: b.win_pct - a.win_pct,
                points_a: a.points_for_total,
                points_b: b.points_for_total,
                points_delta: b.points_for_total - a.points_for_total,
            })
        })
        .collect()
}

/// Actual scoring against projections for one team in one season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionEfficiency {
    pub season: i32,
    pub team: String,
    pub weeks: u32,
    pub avg_points: f64,
    pub avg_projection: f64,
    /// Mean of points_for − projected_points
    pub avg_luck_vs_projection: f64,
    /// Mean of points_for / projected_points
    pub efficiency: f64,
}

/// Efficiency per (season, team) over rows with a positive projection.
///
/// Rows without projections are ignored; a dataset with none yields an
/// empty table.
pub fn projection_efficiency(rows: &[ScoreRow]) -> Vec<ProjectionEfficiency> {
    let mut order: Vec<(i32, &str)> = Vec::new();
    let mut groups: HashMap<(i32, &str), Vec<(f64, f64)>> = HashMap::new();
    for row in rows {
        let Some(projected) = row.projected_points.filter(|p| *p > 0.0) else {
            continue;
        };
        let key = (row.season, row.team.as_str());
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push((row.points_for, projected));
    }

    order.sort_by_key(|(season, _)| *season);
    order
        .into_iter()
        .map(|key| {
            let weeks = &groups[&key];
            let n = weeks.len() as f64;
            let mean = |f: fn(&(f64, f64)) -> f64| weeks.iter().map(f).sum::<f64>() / n;
            ProjectionEfficiency {
                season: key.0,
                team: key.1.to_string(),
                weeks: weeks.len() as u32,
                avg_points: mean(|(actual, _)| *actual),
                avg_projection: mean(|(_, projected)| *projected),
                avg_luck_vs_projection: mean(|(actual, projected)| actual - projected),
                efficiency: mean(|(actual, projected)| actual / projected),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::summary::summarize_all;

    fn rows() -> Vec<ScoreRow> {
        vec![
            ScoreRow::new(2023, 1, "A", "Ann", "B", 150.0, 60.0).with_projection(120.0),
            ScoreRow::new(2023, 1, "B", "Bob", "A", 60.0, 150.0).with_projection(100.0),
            ScoreRow::new(2023, 2, "A", "Ann", "B", 90.0, 95.0).with_projection(100.0),
            ScoreRow::new(2023, 2, "B", "Bob", "A", 95.0, 90.0),
            ScoreRow::new(2023, 3, "A", "Ann", "B", 120.0, 100.0),
            ScoreRow::new(2023, 3, "B", "Bob", "A", 100.0, 120.0),
            ScoreRow::new(2024, 1, "A", "Ann", "B", 80.0, 85.0),
            ScoreRow::new(2024, 1, "B", "Bob", "A", 85.0, 80.0),
            ScoreRow::new(2024, 2, "A", "Ann", "B", 0.0, 0.0),
            ScoreRow::new(2024, 2, "B", "Bob", "A", 0.0, 0.0),
        ]
    }

    #[test]
    fn test_record_book_skips_unplayed_weeks() {
        let book = record_book(&rows(), 2);
        assert_eq!(book.highest_weeks[0].points_for, 150.0);
        assert_eq!(book.highest_weeks[1].points_for, 120.0);
        assert_eq!(book.lowest_weeks[0].points_for, 60.0);
        assert_eq!(book.lowest_weeks[1].points_for, 80.0);
        assert_eq!(book.largest_margins[0].margin, 90.0);
        assert!(book.largest_margins.iter().all(|w| w.margin > 0.0));
    }

    #[test]
    fn test_weekly_awards() {
        let awards = weekly_awards(&rows(), 2023, 1).unwrap();
        assert_eq!(awards.high_score.team, "A");
        assert_eq!(awards.low_score.team, "B");
        assert_eq!(awards.biggest_blowout.unwrap().margin, 90.0);

        let tied = weekly_awards(&rows(), 2024, 2).unwrap();
        assert!(tied.biggest_blowout.is_none());
        assert!(weekly_awards(&rows(), 2024, 9).unwrap_err().is_no_data());
    }

    #[test]
    fn test_matchup_momentum_uses_trailing_window() {
        let summary = matchup_summary(&rows(), 2023, 3, 2).unwrap();
        assert_eq!(summary.games[0].team, "A");
        let a = summary.momentum.iter().find(|m| m.team == "A").unwrap();
        assert_eq!(a.weeks, 2);
        assert_eq!(a.rolling_avg, 105.0);

        let early = matchup_summary(&rows(), 2023, 1, 3).unwrap();
        assert_eq!(early.momentum[0].weeks, 1);
        assert_eq!(early.momentum[0].rolling_avg, 150.0);
    }

    #[test]
    fn test_hall_of_fame_and_comparison() {
        let summaries = summarize_all(&rows(), &MetricsConfig::default());
        let hof = hall_of_fame(&summaries);
        assert_eq!(hof.len(), 2);
        assert_eq!((hof[0].season, hof[0].team.as_str(), hof[0].wins), (2023, "A", 2));
        assert_eq!((hof[1].season, hof[1].team.as_str()), (2024, "B"));

        let cmp = compare_seasons(&summaries, 2023, 2024);
        assert_eq!(cmp.len(), 2);
        let a = &cmp[0];
        assert_eq!(a.team, "A");
        assert!((a.win_pct_delta - (0.0 - 2.0 / 3.0)).abs() < 1e-12);
        assert_eq!(a.points_delta, 80.0 - 360.0);
    }

    #[test]
    fn test_projection_efficiency() {
        let table = projection_efficiency(&rows());
        assert_eq!(table.len(), 2);
        let a = &table[0];
        assert_eq!((a.team.as_str(), a.weeks), ("A", 2));
        assert_eq!(a.avg_points, 120.0);
        assert_eq!(a.avg_projection, 110.0);
        assert_eq!(a.avg_luck_vs_projection, 10.0);
        assert!((a.efficiency - (1.25 + 0.9) / 2.0).abs() < 1e-12);

        let no_projections: Vec<ScoreRow> =
            rows().into_iter().map(|r| ScoreRow { projected_points: None, ..r }).collect();
        assert!(projection_efficiency(&no_projections).is_empty());
    }
}
