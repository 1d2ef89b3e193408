//! Feed types for Gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A subscribed RSS feed.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Display name.
    pub name: String,
    /// Feed URL (unique across all feeds).
    pub url: String,
    /// User who added the feed.
    pub user_id: Uuid,
    /// When the poller last picked this feed; None means never.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Display name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owning user.
    pub user_id: Uuid,
}

impl NewFeed {
    /// Create a new feed request.
    pub fn new(name: impl Into<String>, url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            user_id,
        }
    }
}

/// A feed joined with the name of the user who added it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    /// Feed name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Owner's user name; None if the owner row is gone.
    pub user_name: Option<String>,
}

/// A follow relation joined with user and feed names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Following user.
    pub user_id: Uuid,
    /// Followed feed.
    pub feed_id: Uuid,
    /// Following user's name.
    pub user_name: String,
    /// Followed feed's name.
    pub feed_name: String,
    /// Followed feed's URL.
    pub feed_url: String,
}

/// An ingested post.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Item title.
    pub title: String,
    /// Canonical link to the article.
    pub url: String,
    /// Item description.
    pub description: Option<String>,
    /// Normalized publish time.
    pub published_at: DateTime<Utc>,
    /// Feed the post came from.
    pub feed_id: Uuid,
}

/// New post for creation.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Feed ID.
    pub feed_id: Uuid,
    /// Item title.
    pub title: String,
    /// Link to the original article.
    pub url: String,
    /// Item description.
    pub description: Option<String>,
    /// Normalized publish time.
    pub published_at: DateTime<Utc>,
}

impl NewPost {
    /// Create a new post.
    pub fn new(
        feed_id: Uuid,
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            feed_id,
            title: title.into(),
            url: url.into(),
            description: None,
            published_at,
        }
    }

    /// Set the description. Blank descriptions are stored as NULL.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }
}

/// A feed document as fetched, before any normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in delivery order.
    pub items: Vec<RawFeedItem>,
}

/// A single feed item as delivered by the remote server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    /// Item title.
    pub title: String,
    /// Item link.
    pub link: String,
    /// Item description.
    pub description: String,
    /// Raw `pubDate` text.
    pub pub_date: String,
}

impl RawFeedItem {
    /// Create a raw item.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        description: impl Into<String>,
        pub_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
            pub_date: pub_date.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feed() {
        let user_id = Uuid::new_v4();
        let feed = NewFeed::new("Blog", "https://example.com/feed.xml", user_id);
        assert_eq!(feed.name, "Blog");
        assert_eq!(feed.url, "https://example.com/feed.xml");
        assert_eq!(feed.user_id, user_id);
    }

    #[test]
    fn test_new_post_blank_description() {
        let post = NewPost::new(Uuid::new_v4(), "Title", "https://example.com/1", Utc::now())
            .with_description("   ");
        assert!(post.description.is_none());

        let post = post.with_description("Summary");
        assert_eq!(post.description.as_deref(), Some("Summary"));
    }
}
