//! Ingestion of fetched feed items into posts.

use tracing::{debug, error, warn};
use uuid::Uuid;

use super::date::normalize;
use super::repository::PostRepository;
use super::types::{NewPost, RawFeed};
use crate::db::Database;

/// Outcome counts of one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Posts newly written.
    pub saved: usize,
    /// Items whose (feed, link) already existed.
    pub duplicates: usize,
    /// Items skipped for a missing link or unparseable date.
    pub skipped: usize,
    /// Items whose insert failed.
    pub failed: usize,
}

impl IngestSummary {
    /// Total number of items seen.
    pub fn total(&self) -> usize {
        self.saved + self.duplicates + self.skipped + self.failed
    }
}

/// Writes fetched items as posts of a feed.
pub struct Ingestor<'a> {
    db: &'a Database,
}

impl<'a> Ingestor<'a> {
    /// Create an ingestor writing to `db`.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store every item of `feed` as a post of `feed_id`.
    ///
    /// Items are handled in delivery order. A bad item is logged and
    /// counted; it never stops the remaining items.
    pub async fn ingest(&self, feed_id: Uuid, feed: &RawFeed) -> IngestSummary {
        let repo = PostRepository::new(self.db.pool());
        let mut summary = IngestSummary::default();

        for item in &feed.items {
            if item.link.trim().is_empty() {
                warn!("Skipping item {:?} of feed {}: no link", item.title, feed_id);
                summary.skipped += 1;
                continue;
            }

            let published_at = match normalize(&item.pub_date) {
                Ok(dt) => dt,
                Err(e) => {
                    warn!("Skipping {} of feed {}: {}", item.link, feed_id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let post = NewPost::new(feed_id, item.title.trim(), item.link.trim(), published_at)
                .with_description(item.description.as_str());

            match repo.create_if_absent(&post).await {
                Ok(Some(_)) => summary.saved += 1,
                Ok(None) => summary.duplicates += 1,
                Err(e) => {
                    error!("Failed to store {} for feed {}: {}", item.link, feed_id, e);
                    summary.failed += 1;
                }
            }
        }

        debug!(
            "Ingested feed {}: {} saved, {} duplicate, {} skipped, {} failed",
            feed_id, summary.saved, summary.duplicates, summary.skipped, summary.failed
        );

        summary
    }
}
