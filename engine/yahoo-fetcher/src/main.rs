use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use franchise_registry::FranchiseRegistry;
use season_store::SeasonStore;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yahoo_fetcher::{
    build_all, build_player_stats, build_season, validate_raw, FetcherConfig, YahooFetcher,
};

#[derive(Parser)]
#[command(name = "yahoo-fetcher")]
#[command(about = "Download Yahoo league dumps and build season tables")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides config and LEAGUE_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw dumps for one season or every configured season
    Fetch {
        #[arg(short, long)]
        season: Option<i32>,
    },
    /// Build scores_<season>.csv and player_stats_<season>.csv from raw dumps
    Build {
        #[arg(short, long)]
        season: Option<i32>,
    },
    /// Report missing files in the raw dump tree
    Validate,
}

fn load_config(cli: &Cli) -> Result<FetcherConfig> {
    let config = match &cli.config {
        Some(path) => FetcherConfig::load_from_file(path)?,
        None => FetcherConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(data_dir) = &cli.data_dir {
        config.store.data_dir = data_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!("Using data directory {}", config.store.data_dir.display());

    match cli.command {
        Commands::Fetch { season } => {
            let fetcher = YahooFetcher::new(config)?;
            let reports = match season {
                Some(season) => vec![fetcher.fetch_season(season).await?],
                None => fetcher.fetch_all().await?,
            };
            for report in reports {
                println!(
                    "📥 {} ({}): {} weeks written, skipped weeks {:?}, skipped resources {:?}",
                    report.season,
                    report.league_key,
                    report.weeks_written.len(),
                    report.weeks_skipped,
                    report.resources_skipped
                );
                println!(
                    "   {} rosters written, {} skipped",
                    report.rosters_written,
                    report.rosters_skipped.len()
                );
            }
        }
        Commands::Build { season } => {
            let store = SeasonStore::new(config.store.clone())?;
            let registry = FranchiseRegistry::load_from_file(config.store.franchise_map_path())
                .context("Failed to load franchise map")?;
            let builds = match season {
                Some(season) => vec![build_season(&store, &registry, season)?],
                None => build_all(&store, &registry)?,
            };
            for build in builds {
                match &build.path {
                    Some(path) => println!(
                        "✅ {}: {} rows from weeks {:?} → {} ({} unmatched franchise rows)",
                        build.season,
                        build.rows,
                        build.weeks_parsed,
                        path.display(),
                        build.unmatched
                    ),
                    None => println!("⚠️  {}: no rows parsed", build.season),
                }
                for (week, reason) in &build.weeks_failed {
                    error!("Season {} week {}: {}", build.season, week, reason);
                }

                match build_player_stats(&store, build.season) {
                    Ok(players) => {
                        match &players.path {
                            Some(path) => println!(
                                "✅ {}: {} player rows from weeks {:?} → {}",
                                players.season,
                                players.rows,
                                players.weeks_parsed,
                                path.display()
                            ),
                            None => println!("⚠️  {}: no roster rows parsed", players.season),
                        }
                        for (team, week, reason) in &players.files_failed {
                            error!(
                                "Season {} roster {} week {}: {}",
                                players.season, team, week, reason
                            );
                        }
                    }
                    Err(e) => error!("Failed to build player stats for {}: {:#}", build.season, e),
                }
            }
        }
        Commands::Validate => {
            let root = config.store.raw_api_root();
            let report = validate_raw(&root)?;
            if report.is_empty() {
                println!("No season directories under {}", root.display());
            }
            for season in report {
                println!("=== {} ===", season.season);
                println!("  Scoreboards: weeks {:?}", season.scoreboard_weeks);
                for (team, weeks) in &season.roster_weeks {
                    println!("  Roster {}: {} week file(s)", team, weeks);
                }
                if season.is_ok() {
                    println!("  ✅ Looks good");
                } else {
                    for issue in &season.issues {
                        println!("  ⚠️  {}", issue);
                    }
                }
            }
        }
    }

    Ok(())
}
