//! Feed, follow and post repositories for Gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Feed, FeedFollow, FeedWithOwner, NewFeed, NewPost, Post};
use crate::db::DbPool;
use crate::{GatorError, Result};

const FEED_COLUMNS: &str = "id, created_at, updated_at, name, url, user_id, last_fetched_at";

const POST_COLUMNS: &str =
    "id, created_at, updated_at, title, url, description, published_at, feed_id";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed. The URL must not be registered yet.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        if self.get_by_url(&feed.url).await?.is_some() {
            return Err(GatorError::Validation(format!(
                "feed {} is already registered",
                feed.url
            )));
        }

        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FEED_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Feed>(&query)
            .bind(Uuid::new_v4())
            .bind(now)
            .bind(now)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(created)
    }

    /// Create a feed and have its owner follow it, in one transaction.
    ///
    /// Either both rows are written or neither is.
    pub async fn create_followed(&self, feed: &NewFeed) -> Result<(Feed, FeedFollow)> {
        if self.get_by_url(&feed.url).await?.is_some() {
            return Err(GatorError::Validation(format!(
                "feed {} is already registered",
                feed.url
            )));
        }

        let db_err = |e: sqlx::Error| GatorError::Database(e.to_string());
        let now = Utc::now();
        let follow_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let query = format!(
            r#"
            INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FEED_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Feed>(&query)
            .bind(Uuid::new_v4())
            .bind(now)
            .bind(now)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(feed.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(follow_id)
        .bind(now)
        .bind(now)
        .bind(feed.user_id)
        .bind(created.id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let follow = FeedFollowRepository::new(self.pool)
            .get_by_id(follow_id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))?;

        Ok((created, follow))
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = $1");
        let row = sqlx::query_as::<_, Feed>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row)
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1");
        let row = sqlx::query_as::<_, Feed>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row)
    }

    /// List all feeds with their owner's name (registration order).
    pub async fn list_with_owner(&self) -> Result<Vec<FeedWithOwner>> {
        let rows = sqlx::query_as::<_, FeedWithOwner>(
            r#"
            SELECT f.name, f.url, u.name AS user_name
            FROM feeds f
            LEFT JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at ASC, f.name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Select the feed that has waited longest.
    ///
    /// Never-fetched feeds come first, then the oldest `last_fetched_at`;
    /// ties are broken by ID.
    pub async fn next_to_fetch(&self) -> Result<Feed> {
        let query = format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, Feed>(&query)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        row.ok_or(GatorError::NoFeedsRegistered)
    }

    /// Record that the feed was picked for fetching at `at`.
    pub async fn mark_fetched(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(count)
    }
}

/// Repository for follow relations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Follow a feed. Following the same feed twice is a validation error.
    pub async fn create(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollow> {
        if self.exists(user_id, feed_id).await? {
            return Err(GatorError::Validation(
                "already following this feed".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(feed_id)
        .execute(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".to_string()))
    }

    /// Get a follow by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FeedFollow>> {
        let row = sqlx::query_as::<_, FeedFollow>(
            r#"
            SELECT ff.id, ff.created_at, ff.user_id, ff.feed_id,
                   u.name AS user_name, f.name AS feed_name, f.url AS feed_url
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(row)
    }

    /// Check whether the user follows the feed.
    pub async fn exists(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM feed_follows WHERE user_id = $1 AND feed_id = $2",
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// List the feeds a user follows, by feed name.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollow>> {
        let rows = sqlx::query_as::<_, FeedFollow>(
            r#"
            SELECT ff.id, ff.created_at, ff.user_id, ff.feed_id,
                   u.name AS user_name, f.name AS feed_name, f.url AS feed_url
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = $1
            ORDER BY f.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Remove a follow. Returns false if the user was not following.
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
            .bind(user_id)
            .bind(feed_id)
            .execute(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// A post joined with the name of its feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    /// The post.
    #[sqlx(flatten)]
    pub post: Post,
    /// Name of the feed the post came from.
    pub feed_name: String,
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post unless one with the same (feed, url) already exists.
    ///
    /// Returns `None` when the post already existed.
    pub async fn create_if_absent(&self, post: &NewPost) -> Result<Option<Post>> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (feed_id, url) DO NOTHING
            RETURNING {POST_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Post>(&query)
            .bind(Uuid::new_v4())
            .bind(now)
            .bind(now)
            .bind(&post.title)
            .bind(&post.url)
            .bind(&post.description)
            .bind(post.published_at)
            .bind(post.feed_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(created)
    }

    /// List the newest posts from feeds the user follows.
    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<PostWithFeed>> {
        let rows = sqlx::query_as::<_, PostWithFeed>(
            r#"
            SELECT p.id, p.created_at, p.updated_at, p.title, p.url, p.description,
                   p.published_at, p.feed_id, f.name AS feed_name
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            JOIN feeds f ON f.id = p.feed_id
            WHERE ff.user_id = $1
            ORDER BY p.published_at DESC, p.title ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// List all posts of a feed, newest first.
    pub async fn list_by_feed(&self, feed_id: Uuid) -> Result<Vec<Post>> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE feed_id = $1 ORDER BY published_at DESC, url ASC"
        );
        let rows = sqlx::query_as::<_, Post>(&query)
            .bind(feed_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(rows)
    }

    /// Count posts for a feed.
    pub async fn count_by_feed(&self, feed_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| GatorError::Database(e.to_string()))?;

        Ok(count)
    }
}
