//! Feed aggregation for Gator.
//!
//! This module provides:
//! - Feed, follow and post storage
//! - RSS fetching and publish date normalization
//! - Ingestion of fetched items as posts
//! - The fixed-interval poll scheduler

pub mod date;
pub mod fetcher;
pub mod ingest;
pub mod repository;
pub mod scheduler;
pub mod types;

pub use date::{normalize, DateLayout};
pub use fetcher::{parse_feed, FeedFetcher};
pub use ingest::{IngestSummary, Ingestor};
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository, PostWithFeed};
pub use scheduler::{parse_interval, FeedPoller, ScrapeReport};
pub use types::{Feed, FeedFollow, FeedWithOwner, NewFeed, NewPost, Post, RawFeed, RawFeedItem};
