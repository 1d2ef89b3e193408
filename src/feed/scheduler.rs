//! Feed poll scheduler.
//!
//! Every tick the feed that has waited longest is stamped, fetched and
//! ingested. Feeds are visited round-robin, one per tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use super::fetcher::FeedFetcher;
use super::ingest::{IngestSummary, Ingestor};
use super::repository::FeedRepository;
use super::types::Feed;
use crate::db::Database;
use crate::shutdown::Shutdown;
use crate::{GatorError, Result};

/// Result of one poll cycle.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// The feed that was fetched, as selected (before stamping).
    pub feed: Feed,
    /// Channel title reported by the feed.
    pub channel_title: String,
    /// Ingestion counts.
    pub summary: IngestSummary,
}

/// Fixed-interval feed poller.
pub struct FeedPoller {
    db: Arc<Database>,
    fetcher: FeedFetcher,
    interval: Duration,
}

impl FeedPoller {
    /// Create a poller running one cycle every `interval`.
    pub fn new(db: Arc<Database>, fetcher: FeedFetcher, interval: Duration) -> Self {
        Self {
            db,
            fetcher,
            interval,
        }
    }

    /// Time between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` fires or a cycle fails.
    ///
    /// The first cycle runs immediately.
    pub async fn run(&self, shutdown: Shutdown) -> Result<()> {
        self.run_with(shutdown, |_| Ok(())).await
    }

    /// Like [`run`](Self::run), calling `on_cycle` after each successful cycle.
    pub async fn run_with<F>(&self, shutdown: Shutdown, mut on_cycle: F) -> Result<()>
    where
        F: FnMut(&ScrapeReport) -> Result<()>,
    {
        info!("Feed poller started (interval: {:?})", self.interval);

        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Feed poller stopped");
                    return Ok(());
                }
                _ = timer.tick() => {}
            }

            match self.scrape_next_feed(&shutdown).await {
                Ok(report) => on_cycle(&report)?,
                Err(GatorError::Cancelled) => {
                    info!("Feed poller stopped during fetch");
                    return Ok(());
                }
                Err(e) => {
                    error!("Feed poll cycle failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Run one cycle: select, stamp, fetch and ingest a single feed.
    ///
    /// The feed is stamped before the fetch, so a failing feed still moves
    /// to the back of the rotation.
    /// If `shutdown` has already fired nothing is selected or stamped.
    pub async fn scrape_next_feed(&self, shutdown: &Shutdown) -> Result<ScrapeReport> {
        if shutdown.is_cancelled() {
            return Err(GatorError::Cancelled);
        }

        let feeds = FeedRepository::new(self.db.pool());
        let feed = feeds.next_to_fetch().await?;
        feeds.mark_fetched(feed.id, Utc::now()).await?;
        debug!("Selected feed {} ({})", feed.name, feed.url);

        let raw = self.fetcher.fetch(&feed.url, shutdown).await?;
        let summary = Ingestor::new(&self.db).ingest(feed.id, &raw).await;

        if summary.saved > 0 {
            info!("Feed {} updated: {} new post(s)", feed.name, summary.saved);
        } else {
            debug!("Feed {} updated: no new posts", feed.name);
        }

        Ok(ScrapeReport {
            feed,
            channel_title: raw.title,
            summary,
        })
    }
}

/// Parse a duration such as `"30s"`, `"1m"`, `"1h30m"` or `"1.5s"`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. The total must
/// be positive.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = || GatorError::InvalidInterval(input.to_string());

    let s = input.trim();
    let mut rest = s.strip_prefix('+').unwrap_or(s);
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(num_end);

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let scale = unit_nanos(unit).ok_or_else(invalid)?;
        let nanos = scaled_nanos(number, scale).ok_or_else(invalid)?;
        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = next;
    }

    if total == 0 || total > u128::from(u64::MAX) {
        return Err(invalid());
    }

    Ok(Duration::from_nanos(total as u64))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// Convert a decimal number of `scale`-nanosecond units to nanoseconds.
fn scaled_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = match number.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let mut nanos = whole.checked_mul(scale)?;

    // Digits beyond nanosecond precision are dropped.
    let frac = &frac[..frac.len().min(18)];
    if !frac.is_empty() {
        let numerator: u128 = frac.parse().ok()?;
        let denominator = 10u128.pow(frac.len() as u32);
        nanos = nanos.checked_add(numerator * scale / denominator)?;
    }

    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_units() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_interval("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval("10µs").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn test_parse_interval_compound() {
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(
            parse_interval("1m30s500ms").unwrap(),
            Duration::from_millis(90_500)
        );
    }

    #[test]
    fn test_parse_interval_fractional() {
        assert_eq!(parse_interval("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_interval(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("+1s").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_interval_invalid() {
        for input in [
            "", "10", "s", "abc", "10x", "1d", "-1s", "0s", "0", "1..5s", ".s", "1 s",
        ] {
            assert!(
                matches!(parse_interval(input), Err(GatorError::InvalidInterval(_))),
                "{input:?} should be rejected"
            );
        }
    }
}
