//! RSS feed fetcher.
//!
//! Fetches a feed over HTTP(S) with the configured timeouts, User-Agent and
//! size limit, and parses the body into a [`RawFeed`].

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{RawFeed, RawFeedItem};
use crate::config::FetchConfig;
use crate::shutdown::Shutdown;
use crate::{GatorError, Result};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// HTTP feed fetcher.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse the feed at `url`.
    ///
    /// Returns [`GatorError::Cancelled`] if `shutdown` fires first.
    pub async fn fetch(&self, url: &str, shutdown: &Shutdown) -> Result<RawFeed> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Fetch of {} cancelled", url);
                Err(GatorError::Cancelled)
            }
            result = self.fetch_inner(url) => result,
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<RawFeed> {
        debug!("Fetching feed {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(too_large(url, content_length, self.max_size));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;

        if bytes.len() as u64 > self.max_size {
            return Err(too_large(url, bytes.len() as u64, self.max_size));
        }

        match parse_feed(&bytes) {
            Ok(feed) => {
                if !status.is_success() {
                    warn!("Feed {} returned HTTP {} but parsed; accepting", url, status);
                }
                Ok(feed)
            }
            Err(_) if !status.is_success() => Err(GatorError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            Err(e) => Err(e),
        }
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> GatorError {
    GatorError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn too_large(url: &str, size: u64, max: u64) -> GatorError {
    GatorError::Transport {
        url: url.to_string(),
        message: format!("feed too large: {} bytes (max {} bytes)", size, max),
    }
}

/// Parse an RSS document.
///
/// Missing channel or item fields become empty strings.
pub fn parse_feed(bytes: &[u8]) -> Result<RawFeed> {
    let channel = rss::Channel::read_from(bytes)
        .map_err(|e| GatorError::Parse(format!("failed to parse feed: {}", e)))?;

    let items = channel
        .items()
        .iter()
        .map(|item| {
            RawFeedItem::new(
                item.title().unwrap_or_default(),
                item.link().unwrap_or_default(),
                item.description().unwrap_or_default(),
                item.pub_date().unwrap_or_default(),
            )
        })
        .collect();

    Ok(RawFeed {
        title: channel.title().to_string(),
        link: channel.link().to_string(),
        description: channel.description().to_string(),
        items,
    })
}
