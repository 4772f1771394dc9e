use crate::config::RetryConfig;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delay before the attempt after one that waited `current`
pub fn next_delay(current: Duration, retry: &RetryConfig) -> Duration {
    Duration::from_secs_f64(
        (current.as_secs_f64() * retry.backoff_multiplier).min(retry.max_delay_secs as f64),
    )
}

/// Run a fallible async operation with exponential backoff.
///
/// Returns the last error once `max_retries` attempts have failed.
pub async fn run_with_retry<F, Fut, T>(mut f: F, retry: &RetryConfig, what: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = Duration::from_secs(retry.initial_delay_secs);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= retry.max_retries => {
                return Err(e.context(format!("{what} failed after {attempt} attempts")));
            }
            Err(e) => {
                warn!("{} attempt {} failed: {:#}, retrying in {:?}", what, attempt, e, delay);
                sleep(delay).await;
                delay = next_delay(delay, retry);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn instant() -> RetryConfig {
        RetryConfig { max_retries: 3, initial_delay_secs: 0, ..Default::default() }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let retry = RetryConfig::default();
        let mut delay = Duration::from_secs(retry.initial_delay_secs);
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(delay.as_secs());
            delay = next_delay(delay, &retry);
        }
        assert_eq!(seen, vec![5, 10, 20, 40, 80, 160, 300, 300]);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = run_with_retry(
            || {
                calls += 1;
                let call = calls;
                async move {
                    if call < 3 {
                        bail!("flaky");
                    }
                    Ok(call)
                }
            },
            &instant(),
            "flaky op",
        )
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut calls = 0;
        let result: Result<()> = run_with_retry(
            || {
                calls += 1;
                async { bail!("down") }
            },
            &instant(),
            "scoreboard week 2",
        )
        .await;
        assert_eq!(calls, 3);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("scoreboard week 2 failed after 3 attempts"));
        assert!(message.contains("down"));
    }
}
