//! # Command Line Interface
//!
//! CLI for printing league tables from the season files.

use crate::config::MetricsConfig;
use crate::engine::MetricsEngine;
use crate::expected_wins::TieRule;
use crate::records::TeamWeek;
use crate::summary::{by_power_rank, TeamSeasonSummary};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// League metrics CLI
#[derive(Parser)]
#[command(name = "metrics-cli")]
#[command(about = "Fantasy league standings, luck, power rankings and records")]
pub struct Cli {
    /// Path to the league data directory (overrides config and LEAGUE_DATA_DIR)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tie rule for expected wins (strict or half_credit)
    #[arg(long)]
    pub tie_rule: Option<TieRule>,

    /// Print tables as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List seasons with score files
    Seasons,
    /// Show standings for a season
    Standings {
        /// Season (defaults to the newest)
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show expected wins and luck for a season
    Luck {
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show power rankings for a season
    Power {
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show consistency scores for a season
    Consistency {
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show the all-time franchise legacy ranking
    Legacy,
    /// Show the all-time record book
    Records,
    /// Show weekly awards
    Awards {
        #[arg(long)]
        season: Option<i32>,
        #[arg(long)]
        week: u32,
    },
    /// Show one week's matchups and scoring momentum
    Matchups {
        #[arg(long)]
        season: Option<i32>,
        #[arg(long)]
        week: u32,
    },
    /// Show the team with the most wins in each season
    HallOfFame,
    /// Compare teams across two seasons
    Compare {
        /// Earlier season
        #[arg(long)]
        a: i32,
        /// Later season
        #[arg(long)]
        b: i32,
    },
    /// Show scoring against projections
    Efficiency {
        /// Restrict to one season
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show player scoring leaders
    Players {
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show the payout ledger
    Payouts {
        /// Restrict to one year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Check that every row has a mirrored opponent row
    Check {
        #[arg(long)]
        season: Option<i32>,
    },
    /// Write the combined multi-season file
    Combine,
    /// Split the combined file back into season files
    Backfill {
        /// Replace season files that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Suggest franchises for unmatched team/manager names
    Suggest,
    /// Stamp franchise ids onto every season file
    Stamp,
}

/// Build the effective configuration: file, then environment, then flags
pub fn resolve_config(cli: &Cli) -> Result<MetricsConfig> {
    let config = match &cli.config {
        Some(path) => MetricsConfig::load_from_file(path)?,
        None => MetricsConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(data_dir) = &cli.data_dir {
        config.store.data_dir = data_dir.clone();
    }
    if let Some(rule) = cli.tie_rule {
        config.expected_wins.tie_rule = rule;
    }
    Ok(config)
}

/// CLI handler
pub struct CliHandler {
    engine: MetricsEngine,
    json: bool,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(config: MetricsConfig, json: bool) -> Result<Self> {
        let engine = MetricsEngine::new(config).context("Failed to start metrics engine")?;
        Ok(Self { engine, json })
    }

    /// Handle CLI commands
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Seasons => self.show_seasons(),
            Commands::Standings { season } => self.show_standings(season),
            Commands::Luck { season } => self.show_luck(season),
            Commands::Power { season } => self.show_power(season),
            Commands::Consistency { season } => self.show_consistency(season),
            Commands::Legacy => self.show_legacy(),
            Commands::Records => self.show_records(),
            Commands::Awards { season, week } => self.show_awards(season, week),
            Commands::Matchups { season, week } => self.show_matchups(season, week),
            Commands::HallOfFame => self.show_hall_of_fame(),
            Commands::Compare { a, b } => self.show_comparison(a, b),
            Commands::Efficiency { season } => self.show_efficiency(season),
            Commands::Players { season } => self.show_players(season),
            Commands::Payouts { year } => self.show_payouts(year),
            Commands::Check { season } => self.check_pairing(season),
            Commands::Combine => self.combine(),
            Commands::Backfill { overwrite } => self.backfill(overwrite),
            Commands::Suggest => self.show_suggestions(),
            Commands::Stamp => self.stamp(),
        }
    }

    fn season_or_latest(&self, season: Option<i32>) -> Result<i32> {
        match season {
            Some(season) => Ok(season),
            None => Ok(self.engine.latest_season()?),
        }
    }

    fn header(&self, title: &str) {
        if !self.json {
            println!("{title}");
            println!("{}", "=".repeat(50));
        }
    }

    /// Print as JSON when requested; returns true if it did
    fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }

    fn summaries(&self, season: Option<i32>) -> Result<(i32, Vec<TeamSeasonSummary>)> {
        let season = self.season_or_latest(season)?;
        Ok((season, self.engine.season_summary(season)?))
    }

    fn show_seasons(&self) -> Result<()> {
        let seasons = self.engine.seasons()?;
        if self.emit_json(&seasons)? {
            return Ok(());
        }
        self.header("📅 Seasons");
        if seasons.is_empty() {
            println!("No data found");
        }
        for season in seasons {
            println!("{season}");
        }
        Ok(())
    }

    fn show_standings(&self, season: Option<i32>) -> Result<()> {
        let (season, mut table) = self.summaries(season)?;
        table.sort_by(|a, b| {
            b.win_pct
                .total_cmp(&a.win_pct)
                .then(b.points_for_total.total_cmp(&a.points_for_total))
        });
        if self.emit_json(&table)? {
            return Ok(());
        }
        self.header(&format!("🏈 Standings {season}"));
        println!(
            "{:<28} {:>8} {:>7} {:>9} {:>8} {:>8}",
            "Team", "Record", "Win%", "PF", "Avg", "Margin"
        );
        for s in &table {
            println!(
                "{:<28} {:>8} {:>7.3} {:>9.2} {:>8.2} {:>8.2}",
                s.team,
                s.record_string(),
                s.win_pct,
                s.points_for_total,
                s.avg_points,
                s.avg_margin
            );
        }
        Ok(())
    }

    fn show_luck(&self, season: Option<i32>) -> Result<()> {
        let (season, mut table) = self.summaries(season)?;
        table.sort_by(|a, b| b.luck_index.total_cmp(&a.luck_index));
        if self.emit_json(&table)? {
            return Ok(());
        }
        let rule = self.engine.config().expected_wins.tie_rule;
        self.header(&format!("🍀 Luck Index {season} ({rule})"));
        println!("{:<28} {:>5} {:>9} {:>8} {:>8}", "Team", "Wins", "Exp Wins", "Luck", "Luck%");
        for s in &table {
            println!(
                "{:<28} {:>5} {:>9.2} {:>+8.2} {:>+8.3}",
                s.team, s.wins, s.expected_wins, s.luck_index, s.luck_pct
            );
        }
        Ok(())
    }

    fn show_power(&self, season: Option<i32>) -> Result<()> {
        let (season, table) = self.summaries(season)?;
        let ranked = by_power_rank(&table);
        if self.emit_json(&ranked)? {
            return Ok(());
        }
        self.header(&format!("⚡ Power Rankings {season}"));
        println!(
            "{:>4} {:<28} {:>7} {:>8} {:>7} {:>8}",
            "Rank", "Team", "Score", "Avg", "Win%", "Luck"
        );
        for s in ranked {
            println!(
                "{:>4} {:<28} {:>7.1} {:>8.2} {:>7.3} {:>+8.2}",
                s.power_rank, s.team, s.power_score, s.avg_points, s.win_pct, s.luck_index
            );
        }
        Ok(())
    }

    fn show_consistency(&self, season: Option<i32>) -> Result<()> {
        let season = self.season_or_latest(season)?;
        let rows = self.engine.season_rows(season)?;
        let mut table = crate::consistency::compute_consistency(&rows);
        table.sort_by(|a, b| b.consistency_score.total_cmp(&a.consistency_score));
        if self.emit_json(&table)? {
            return Ok(());
        }
        self.header(&format!("📏 Consistency {season}"));
        println!(
            "{:<28} {:>6} {:>8} {:>8} {:>7}  Band",
            "Team", "Weeks", "Mean", "StDev", "Score"
        );
        for c in &table {
            println!(
                "{:<28} {:>6} {:>8.2} {:>8.2} {:>7.3}  {}",
                c.team, c.weeks, c.mean_points, c.stdev, c.consistency_score, c.band
            );
        }
        Ok(())
    }

    fn show_legacy(&self) -> Result<()> {
        let table = self.engine.legacy()?;
        if self.emit_json(&table)? {
            return Ok(());
        }
        let decay = self.engine.config().legacy.decay;
        self.header(&format!("🏛️ Franchise Legacy (decay {decay})"));
        println!(
            "{:>4} {:<32} {:<24} {:>7} {:>8}",
            "Rank", "Franchise", "Latest Team", "Seasons", "Legacy"
        );
        for e in &table {
            println!(
                "{:>4} {:<32} {:<24} {:>7} {:>8.2}",
                e.rank,
                e.identity.key(),
                e.latest_team,
                e.seasons,
                e.legacy_index
            );
        }
        Ok(())
    }

    fn print_team_weeks(title: &str, weeks: &[TeamWeek], value: fn(&TeamWeek) -> f64) {
        println!("\n{title}");
        println!("{}", "-".repeat(50));
        for w in weeks {
            println!(
                "{:>4} wk{:<3} {:<24} {:>8.2}  vs {}",
                w.season,
                w.week,
                w.team,
                value(w),
                w.opponent
            );
        }
    }

    fn show_records(&self) -> Result<()> {
        let book = self.engine.record_book()?;
        if self.emit_json(&book)? {
            return Ok(());
        }
        self.header("📖 Record Book");
        Self::print_team_weeks("Highest Team Weeks", &book.highest_weeks, |w| w.points_for);
        Self::print_team_weeks("Lowest Team Weeks", &book.lowest_weeks, |w| w.points_for);
        Self::print_team_weeks("Biggest Blowouts", &book.largest_margins, |w| w.margin);
        Ok(())
    }

    fn show_awards(&self, season: Option<i32>, week: u32) -> Result<()> {
        let season = self.season_or_latest(season)?;
        let awards = self.engine.weekly_awards(season, week)?;
        if self.emit_json(&awards)? {
            return Ok(());
        }
        self.header(&format!("🏆 Weekly Awards {season} week {week}"));
        println!("High score:  {} ({:.2})", awards.high_score.team, awards.high_score.points_for);
        println!("Low score:   {} ({:.2})", awards.low_score.team, awards.low_score.points_for);
        match &awards.biggest_blowout {
            Some(b) => println!("Blowout:     {} over {} by {:.2}", b.team, b.opponent, b.margin),
            None => println!("Blowout:     none"),
        }
        Ok(())
    }

    fn show_matchups(&self, season: Option<i32>, week: u32) -> Result<()> {
        let season = self.season_or_latest(season)?;
        let summary = self.engine.matchup_summary(season, week)?;
        if self.emit_json(&summary)? {
            return Ok(());
        }
        self.header(&format!("🆚 Matchups {season} week {week}"));
        for g in &summary.games {
            println!(
                "{:<28} {:>8.2} - {:<8.2} {}",
                g.team, g.points_for, g.points_against, g.opponent
            );
        }
        println!("\nMomentum ({}-week average)", self.engine.config().records.momentum_window);
        println!("{}", "-".repeat(50));
        for m in &summary.momentum {
            println!("{:<28} {:>8.2}", m.team, m.rolling_avg);
        }
        Ok(())
    }

    fn show_hall_of_fame(&self) -> Result<()> {
        let table = self.engine.hall_of_fame()?;
        if self.emit_json(&table)? {
            return Ok(());
        }
        self.header("🏅 Hall of Fame");
        for e in &table {
            println!(
                "{} {:<28} {:<20} {:>3} wins {:>9.2} pts",
                e.season, e.team, e.manager, e.wins, e.points_for_total
            );
        }
        Ok(())
    }

    fn show_comparison(&self, a: i32, b: i32) -> Result<()> {
        let table = self.engine.compare_seasons(a, b)?;
        if self.emit_json(&table)? {
            return Ok(());
        }
        self.header(&format!("📊 Season Comparison {a} → {b}"));
        println!(
            "{:<28} {:>7} {:>7} {:>8} {:>9}",
            "Team", "Win% A", "Win% B", "ΔWin%", "ΔPoints"
        );
        for c in &table {
            println!(
                "{:<28} {:>7.3} {:>7.3} {:>+8.3} {:>+9.2}",
                c.team, c.win_pct_a, c.win_pct_b, c.win_pct_delta, c.points_delta
            );
        }
        Ok(())
    }

    fn show_efficiency(&self, season: Option<i32>) -> Result<()> {
        let table = self.engine.projection_efficiency(season)?;
        if self.emit_json(&table)? {
            return Ok(());
        }
        self.header("🎯 Projection Efficiency");
        if table.is_empty() {
            println!("No projected_points available in this dataset");
            return Ok(());
        }
        println!(
            "{:>6} {:<28} {:>8} {:>8} {:>8} {:>6}",
            "Season", "Team", "Avg", "Proj", "Luck", "Eff"
        );
        for e in &table {
            println!(
                "{:>6} {:<28} {:>8.2} {:>8.2} {:>+8.2} {:>6.3}",
                e.season,
                e.team,
                e.avg_points,
                e.avg_projection,
                e.avg_luck_vs_projection,
                e.efficiency
            );
        }
        Ok(())
    }

    fn show_players(&self, season: Option<i32>) -> Result<()> {
        let season = match season {
            Some(season) => season,
            None => self
                .engine
                .store()
                .player_seasons_available()?
                .last()
                .copied()
                .context("No player stat files found")?,
        };
        let (leaders, weeks) = self.engine.player_leaders(season)?;
        if self.json {
            let value =
                serde_json::json!({ "season": season, "leaders": leaders, "top_weeks": weeks });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }
        self.header(&format!("⭐ Player Leaders {season}"));
        for p in &leaders {
            println!(
                "{:<26} {:<5} {:<24} {:>8.2}",
                p.player_name, p.position, p.team, p.total_points
            );
        }
        println!("\nTop Single Weeks");
        println!("{}", "-".repeat(50));
        for w in &weeks {
            println!(
                "wk{:<3} {:<26} {:<5} {:<24} {:>7.2}",
                w.week, w.player_name, w.position, w.team, w.actual_points
            );
        }
        Ok(())
    }

    fn show_payouts(&self, year: Option<i32>) -> Result<()> {
        let ledger = self.engine.payouts(year)?;
        if self.emit_json(&ledger)? {
            return Ok(());
        }
        let scope = year.map_or_else(|| "All-Time".to_string(), |y| y.to_string());
        self.header(&format!("💸 Payouts ({scope})"));
        println!("💰 Pot:      ${:.2}", ledger.pot);
        println!("💵 Payouts:  ${:.2}", ledger.payouts);
        println!("🏦 Balance:  ${:.2}", ledger.balance);
        println!("\n{:<24} {:>10} {:>10} {:>10}", "Owner", "Winnings", "Fees", "Net");
        for o in &ledger.owners {
            println!("{:<24} {:>10.2} {:>10.2} {:>+10.2}", o.winner, o.winnings, o.fees, o.net);
        }
        println!("\n{:<24} {:>10}", "Category", "Payouts");
        for c in &ledger.categories {
            println!("{:<24} {:>10.2}", c.category, c.payouts);
        }
        Ok(())
    }

    fn check_pairing(&self, season: Option<i32>) -> Result<()> {
        let season = self.season_or_latest(season)?;
        let issues = self.engine.pairing_issues(season)?;
        if self.emit_json(&issues)? {
            return Ok(());
        }
        self.header(&format!("🔍 Pairing Check {season}"));
        if issues.is_empty() {
            println!("✅ Every row has a mirrored opponent row");
        }
        for i in &issues {
            println!("⚠️  week {:<3} {:<28} {}", i.week, i.team, i.detail);
        }
        Ok(())
    }

    fn combine(&self) -> Result<()> {
        let load = self.engine.store().write_combined()?;
        println!("✅ Combined {} rows from seasons {:?}", load.rows.len(), load.loaded);
        for (season, reason) in &load.skipped {
            println!("⚠️  Skipped {season}: {reason}");
        }
        Ok(())
    }

    fn backfill(&self, overwrite: bool) -> Result<()> {
        let report = self.engine.store().backfill_from_combined(overwrite)?;
        println!("✅ Wrote seasons {:?}", report.written);
        if !report.kept_existing.is_empty() {
            println!(
                "ℹ️  Kept existing files for {:?} (use --overwrite to replace)",
                report.kept_existing
            );
        }
        Ok(())
    }

    fn show_suggestions(&self) -> Result<()> {
        let suggestions = self.engine.franchise_suggestions()?;
        if self.emit_json(&suggestions)? {
            return Ok(());
        }
        self.header("🔗 Franchise Suggestions");
        if suggestions.is_empty() {
            println!("🎉 All teams/managers matched or no close matches found");
        }
        for s in &suggestions {
            println!(
                "{:<28} {:<20} -> {:<8} ({:.2})",
                s.team, s.manager, s.suggested_franchise, s.confidence
            );
        }
        Ok(())
    }

    fn stamp(&self) -> Result<()> {
        let (written, unmatched) = self.engine.stamp_franchises()?;
        println!("✅ Stamped {} season file(s)", written.len());
        if unmatched > 0 {
            println!("⚠️  {unmatched} row(s) without a franchise; run `suggest` for candidates");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "metrics-cli",
            "--data-dir",
            "/tmp/league",
            "--tie-rule",
            "half_credit",
            "luck",
            "--season",
            "2023",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.tie_rule, Some(TieRule::HalfCredit));
        assert!(matches!(cli.command, Commands::Luck { season: Some(2023) }));

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/league"));
        assert_eq!(config.expected_wins.tie_rule, TieRule::HalfCredit);
    }

    #[test]
    fn test_awards_requires_week() {
        assert!(Cli::try_parse_from(["metrics-cli", "awards"]).is_err());
        let cli = Cli::try_parse_from(["metrics-cli", "awards", "--week", "4"]).unwrap();
        assert!(matches!(cli.command, Commands::Awards { season: None, week: 4 }));
    }
}
