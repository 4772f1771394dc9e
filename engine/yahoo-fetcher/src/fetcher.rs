use crate::config::FetcherConfig;
use crate::raw::{
    roster_path, scoreboard_path, season_dir, write_json, STANDINGS_FILE, TEAMS_FILE,
};
use crate::retry::run_with_retry;
use crate::roster::team_keys;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// What a season download produced
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub season: i32,
    pub league_key: String,
    pub weeks_written: Vec<u32>,
    /// Weeks that still failed after every retry
    pub weeks_skipped: Vec<u32>,
    /// League resources (`standings`, `teams`) that could not be fetched
    pub resources_skipped: Vec<String>,
    /// Roster dumps written across every team and week
    pub rosters_written: usize,
    /// (team key, week) rosters that still failed after every retry
    pub rosters_skipped: Vec<(String, u32)>,
    pub fetched_at: DateTime<Utc>,
}

/// Downloads raw league dumps from the Yahoo Fantasy API
pub struct YahooFetcher {
    config: FetcherConfig,
    client: Client,
    token: String,
}

impl YahooFetcher {
    /// Create a fetcher using the token from the configured environment variable
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let token = config.access_token()?;
        Self::with_token(config, token)
    }

    pub fn with_token(config: FetcherConfig, token: impl Into<String>) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.yahoo.timeout_secs));
        if !config.yahoo.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { config, client, token: token.into() })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// URL of a league resource, e.g. `scoreboard;week=3`
    pub fn league_url(&self, league_key: &str, resource: &str) -> String {
        format!(
            "{}/league/{}/{}?format=json",
            self.config.yahoo.api_base.trim_end_matches('/'),
            league_key,
            resource
        )
    }

    /// URL of a team resource, e.g. `roster;week=3`
    pub fn team_url(&self, team_key: &str, resource: &str) -> String {
        format!(
            "{}/team/{}/{}?format=json",
            self.config.yahoo.api_base.trim_end_matches('/'),
            team_key,
            resource
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("API request failed with status: {}", response.status());
        }

        response.json().await.context("Failed to parse response JSON")
    }

    async fn fetch_url(&self, url: String, what: &str) -> Result<Value> {
        info!("Fetching {}", url);
        run_with_retry(|| self.get_json(&url), &self.config.retry, what).await
    }

    /// Fetch one league resource with retry and backoff
    pub async fn fetch_resource(&self, league_key: &str, resource: &str) -> Result<Value> {
        self.fetch_url(self.league_url(league_key, resource), resource).await
    }

    /// Fetch one team resource with retry and backoff
    pub async fn fetch_team_resource(&self, team_key: &str, resource: &str) -> Result<Value> {
        self.fetch_url(self.team_url(team_key, resource), resource).await
    }

    async fn pause(&self) {
        if self.config.yahoo.request_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.yahoo.request_delay_ms)).await;
        }
    }

    /// Download standings, teams, every week's scoreboard and every team's
    /// weekly roster for a season.
    ///
    /// A week that keeps failing is skipped; the remaining weeks continue.
    /// Rosters need the team keys from `teams`, so they are skipped when that
    /// resource could not be fetched.
    pub async fn fetch_season(&self, season: i32) -> Result<FetchReport> {
        let league_key = self.config.league_key(season)?.to_string();
        let root = self.config.store.raw_api_root();
        let dir = season_dir(&root, season);
        info!("Fetching season {} (league {}) into {}", season, league_key, dir.display());

        let mut report = FetchReport {
            season,
            league_key: league_key.clone(),
            weeks_written: Vec::new(),
            weeks_skipped: Vec::new(),
            resources_skipped: Vec::new(),
            rosters_written: 0,
            rosters_skipped: Vec::new(),
            fetched_at: Utc::now(),
        };

        let mut teams = Vec::new();
        for (resource, file) in [("standings", STANDINGS_FILE), ("teams", TEAMS_FILE)] {
            match self.fetch_resource(&league_key, resource).await {
                Ok(document) => {
                    write_json(&dir.join(file), &document)?;
                    if file == TEAMS_FILE {
                        teams = team_keys(&document).unwrap_or_else(|e| {
                            warn!("No team keys in season {} teams: {:#}", season, e);
                            Vec::new()
                        });
                    }
                }
                Err(e) => {
                    warn!("Skipping {} for season {}: {:#}", resource, season, e);
                    report.resources_skipped.push(resource.to_string());
                }
            }
            self.pause().await;
        }

        for week in 1..=self.config.yahoo.end_week {
            let resource = format!("scoreboard;week={week}");
            match self.fetch_resource(&league_key, &resource).await {
                Ok(document) => {
                    write_json(&scoreboard_path(&root, season, week), &document)?;
                    report.weeks_written.push(week);
                }
                Err(e) => {
                    warn!("Skipping week {} of season {}: {:#}", week, season, e);
                    report.weeks_skipped.push(week);
                }
            }
            self.pause().await;
        }

        for team_key in &teams {
            for week in 1..=self.config.yahoo.end_week {
                let resource = format!("roster;week={week}");
                match self.fetch_team_resource(team_key, &resource).await {
                    Ok(document) => {
                        write_json(&roster_path(&root, season, team_key, week), &document)?;
                        report.rosters_written += 1;
                    }
                    Err(e) => {
                        warn!("Skipping roster of {} week {}: {:#}", team_key, week, e);
                        report.rosters_skipped.push((team_key.clone(), week));
                    }
                }
                self.pause().await;
            }
        }

        info!(
            "Season {}: {} weeks written, {} skipped, {} rosters written",
            season,
            report.weeks_written.len(),
            report.weeks_skipped.len(),
            report.rosters_written
        );
        Ok(report)
    }

    /// Fetch every configured season; a failing season is logged and skipped
    pub async fn fetch_all(&self) -> Result<Vec<FetchReport>> {
        let mut reports = Vec::new();
        for season in self.config.seasons()? {
            match self.fetch_season(season).await {
                Ok(report) => reports.push(report),
                Err(e) => warn!("Failed to fetch season {}: {:#}", season, e),
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_player_stats;
    use crate::config::RetryConfig;
    use crate::roster::tests::{player, roster, teams};
    use season_store::SeasonStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server: anything for week 2 fails, `teams` lists Alpha
    /// and Beta, rosters hold one player, everything else returns `{}`
    async fn serve(hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                let hits = Arc::clone(&hits);
                tokio::spawn(async move {
                    let mut request: Vec<u8> = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    hits.fetch_add(1, Ordering::SeqCst);
                    let request = String::from_utf8_lossy(&request);
                    let path = request.split_whitespace().nth(1).unwrap_or_default().to_string();
                    let authorized = request.contains("Bearer test-token");
                    let status = if !authorized {
                        "401 Unauthorized"
                    } else if path.contains("week=2") {
                        "500 Internal Server Error"
                    } else {
                        "200 OK"
                    };
                    let body = if path.contains("/teams?") {
                        teams(&["Alpha", "Beta"]).to_string()
                    } else if path.contains("/roster;") {
                        let name = if path.contains("t.Alpha") { "Alpha" } else { "Beta" };
                        roster(name, "m", 1, vec![player("Sam Runner", "RB", &["RB"], "9.5")])
                            .to_string()
                    } else {
                        r#"{"fantasy_content":{}}"#.to_string()
                    };
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn config(api_base: String, temp_dir: &TempDir) -> FetcherConfig {
        let mut config = FetcherConfig::default();
        config.store.data_dir = temp_dir.path().to_path_buf();
        config.yahoo.api_base = api_base;
        config.yahoo.end_week = 3;
        config.yahoo.request_delay_ms = 0;
        config.yahoo.use_system_proxy = false;
        config.yahoo.league_keys.insert("2023".to_string(), "423.l.1".to_string());
        config.retry = RetryConfig { max_retries: 2, initial_delay_secs: 0, ..Default::default() };
        config
    }

    #[test]
    fn test_league_url() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher =
            YahooFetcher::with_token(config("https://api.example/v2/".into(), &temp_dir), "t")
                .unwrap();
        assert_eq!(
            fetcher.league_url("423.l.1", "scoreboard;week=3"),
            "https://api.example/v2/league/423.l.1/scoreboard;week=3?format=json"
        );
        assert_eq!(
            fetcher.team_url("423.l.1.t.4", "roster;week=3"),
            "https://api.example/v2/team/423.l.1.t.4/roster;week=3?format=json"
        );
    }

    #[tokio::test]
    async fn test_failing_week_is_skipped_after_retries() {
        let temp_dir = TempDir::new().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(Arc::clone(&hits)).await;
        let fetcher = YahooFetcher::with_token(config(base, &temp_dir), "test-token").unwrap();

        let report = fetcher.fetch_season(2023).await.unwrap();
        assert_eq!(report.weeks_written, vec![1, 3]);
        assert_eq!(report.weeks_skipped, vec![2]);
        assert!(report.resources_skipped.is_empty());
        assert_eq!(report.rosters_written, 4);
        assert_eq!(
            report.rosters_skipped,
            vec![("423.l.1.t.Alpha".to_string(), 2), ("423.l.1.t.Beta".to_string(), 2)]
        );
        // standings + teams + 3 scoreboard weeks + 2 teams x 3 roster weeks,
        // each week 2 request tried twice
        assert_eq!(hits.load(Ordering::SeqCst), 2 + 4 + 2 * 4);

        let dir = temp_dir.path().join("raw/api/2023");
        assert!(dir.join("standings.json").exists());
        assert!(dir.join("scoreboard_week_3.json").exists());
        assert!(!dir.join("scoreboard_week_2.json").exists());
        assert!(dir.join("rosters/423_l_1_t_Alpha/week_3.json").exists());
        assert!(!dir.join("rosters/423_l_1_t_Beta/week_2.json").exists());
    }

    #[tokio::test]
    async fn test_fetched_rosters_build_player_stats() {
        let temp_dir = TempDir::new().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(Arc::clone(&hits)).await;
        let config = config(base, &temp_dir);
        let store = SeasonStore::new(config.store.clone()).unwrap();
        let fetcher = YahooFetcher::with_token(config, "test-token").unwrap();
        fetcher.fetch_season(2023).await.unwrap();

        let build = build_player_stats(&store, 2023).unwrap();
        assert_eq!(build.weeks_parsed, vec![1, 3]);
        assert!(build.files_failed.is_empty());

        let rows = store.load_player_stats(2023).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.player_name == "Sam Runner" && r.actual_points == 9.5));
        assert_eq!(rows.iter().filter(|r| r.team == "Alpha").count(), 2);
        assert_eq!(rows.iter().map(|r| r.week).collect::<Vec<_>>(), vec![1, 1, 3, 3]);
    }

    #[tokio::test]
    async fn test_unconfigured_season_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher =
            YahooFetcher::with_token(config("http://127.0.0.1:9".into(), &temp_dir), "t").unwrap();
        assert!(fetcher.fetch_season(1999).await.is_err());
    }
}
