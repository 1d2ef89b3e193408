//! The `agg` command: run the feed poller until interrupted.

use std::io::Write;

use tracing::info;

use super::State;
use crate::feed::{parse_interval, FeedFetcher, FeedPoller, FeedRepository};
use crate::shutdown::Shutdown;
use crate::Result;

/// Poll feeds every `interval` until `shutdown` fires.
pub async fn handle_agg<W: Write>(
    state: &State,
    interval: &str,
    shutdown: Shutdown,
    out: &mut W,
) -> Result<()> {
    let interval = parse_interval(interval)?;
    let fetcher = FeedFetcher::new(&state.config.fetch)?;
    let poller = FeedPoller::new(state.db.clone(), fetcher, interval);

    let registered = FeedRepository::new(state.db.pool()).count().await?;
    info!("Polling {} feed(s) every {:?}", registered, interval);

    writeln!(out, "Collecting feeds every {:?}", poller.interval())?;
    out.flush()?;

    poller
        .run_with(shutdown, |report| {
            let summary = &report.summary;
            writeln!(
                out,
                "Fetched {} ({}): {} item(s), {} new, {} duplicate, {} skipped, {} failed",
                report.feed.name,
                report.feed.url,
                summary.total(),
                summary.saved,
                summary.duplicates,
                summary.skipped,
                summary.failed
            )?;
            out.flush()?;
            Ok(())
        })
        .await
}
