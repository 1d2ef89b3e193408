//! Feed commands: addfeed, feeds, follow, following, unfollow, browse.

use std::io::Write;

use tracing::info;

use super::session::require_user;
use super::State;
use crate::datetime::format_default;
use crate::feed::{FeedFollowRepository, FeedRepository, NewFeed, PostRepository};
use crate::{GatorError, Result};

/// Number of posts `browse` shows when no limit is given.
pub const DEFAULT_BROWSE_LIMIT: u32 = 2;

/// Check that a feed URL is an absolute http(s) URL.
pub fn validate_feed_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| GatorError::Validation(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatorError::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(GatorError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

/// Register a feed for the current user and follow it.
pub async fn handle_addfeed<W: Write>(
    state: &State,
    name: &str,
    url: &str,
    out: &mut W,
) -> Result<()> {
    let user = require_user(state).await?;

    let name = name.trim();
    if name.is_empty() {
        return Err(GatorError::Validation(
            "feed name must not be empty".to_string(),
        ));
    }
    validate_feed_url(url)?;

    let (feed, follow) = FeedRepository::new(state.db.pool())
        .create_followed(&NewFeed::new(name, url, user.id))
        .await?;
    info!("User {} added feed {} ({})", user.name, feed.name, feed.url);

    writeln!(out, "Feed added: {}", follow.feed_name)?;
    writeln!(out, "URL: {}", follow.feed_url)?;
    writeln!(out, "Followed by: {}", follow.user_name)?;
    Ok(())
}

/// List every registered feed.
pub async fn handle_feeds<W: Write>(state: &State, out: &mut W) -> Result<()> {
    let feeds = FeedRepository::new(state.db.pool())
        .list_with_owner()
        .await?;

    if feeds.is_empty() {
        writeln!(out, "No feeds registered.")?;
        return Ok(());
    }

    for feed in feeds {
        writeln!(out, "* {}", feed.name)?;
        writeln!(out, "  URL: {}", feed.url)?;
        if let Some(owner) = feed.user_name {
            writeln!(out, "  Added by: {}", owner)?;
        }
    }
    Ok(())
}

/// Follow a registered feed.
pub async fn handle_follow<W: Write>(state: &State, url: &str, out: &mut W) -> Result<()> {
    let user = require_user(state).await?;

    let feed = FeedRepository::new(state.db.pool())
        .get_by_url(url)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("feed {}", url)))?;

    let follow = FeedFollowRepository::new(state.db.pool())
        .create(user.id, feed.id)
        .await?;

    writeln!(out, "{} now follows {}", follow.user_name, follow.feed_name)?;
    Ok(())
}

/// List the feeds the current user follows.
pub async fn handle_following<W: Write>(state: &State, out: &mut W) -> Result<()> {
    let user = require_user(state).await?;

    let follows = FeedFollowRepository::new(state.db.pool())
        .list_for_user(user.id)
        .await?;

    if follows.is_empty() {
        writeln!(out, "{} follows no feeds.", user.name)?;
        return Ok(());
    }

    writeln!(out, "Feeds followed by {}:", user.name)?;
    for follow in follows {
        writeln!(out, "* {} ({})", follow.feed_name, follow.feed_url)?;
    }
    Ok(())
}

/// Stop following a feed.
pub async fn handle_unfollow<W: Write>(state: &State, url: &str, out: &mut W) -> Result<()> {
    let user = require_user(state).await?;

    let feed = FeedRepository::new(state.db.pool())
        .get_by_url(url)
        .await?
        .ok_or_else(|| GatorError::NotFound(format!("feed {}", url)))?;

    let removed = FeedFollowRepository::new(state.db.pool())
        .delete(user.id, feed.id)
        .await?;

    if removed {
        writeln!(out, "{} unfollowed {}", user.name, feed.name)?;
    } else {
        writeln!(out, "{} was not following {}", user.name, feed.name)?;
    }
    Ok(())
}

/// Show the newest posts from the current user's feeds.
pub async fn handle_browse<W: Write>(state: &State, limit: u32, out: &mut W) -> Result<()> {
    let user = require_user(state).await?;

    if limit == 0 {
        return Err(GatorError::Validation(
            "limit must be greater than zero".to_string(),
        ));
    }

    let posts = PostRepository::new(state.db.pool())
        .list_for_user(user.id, i64::from(limit))
        .await?;

    if posts.is_empty() {
        writeln!(out, "No posts yet. Follow a feed and run `gator agg`.")?;
        return Ok(());
    }

    let timezone = &state.config.display.timezone;
    for entry in posts {
        let post = entry.post;
        writeln!(
            out,
            "{} from {}",
            format_default(&post.published_at, timezone),
            entry.feed_name
        )?;
        writeln!(out, "--- {} ---", post.title)?;
        if let Some(description) = post.description {
            writeln!(out, "    {}", description)?;
        }
        writeln!(out, "Link: {}", post.url)?;
        writeln!(out)?;
    }
    Ok(())
}


#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{Database, NewUser, UserRepository};
    use crate::feed::NewPost;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (State, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        for name in ["alice", "bob"] {
            UserRepository::new(db.pool())
                .create(&NewUser::new(name))
                .await
                .unwrap();
        }
        let mut config = Config::default();
        config.session.current_user = Some("alice".to_string());
        let state = State::new(config, dir.path().join("gator.toml"), db);
        (state, dir)
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_addfeed_follows_automatically() {
        let (state, _dir) = setup().await;
        let mut out = Vec::new();

        handle_addfeed(&state, "Blog", "https://example.com/rss", &mut out)
            .await
            .unwrap();

        let text = output(out);
        assert!(text.contains("Feed added: Blog"));
        assert!(text.contains("Followed by: alice"));

        let mut out = Vec::new();
        handle_following(&state, &mut out).await.unwrap();
        assert!(output(out).contains("* Blog (https://example.com/rss)"));
    }

    #[tokio::test]
    async fn test_addfeed_requires_login() {
        let (mut state, _dir) = setup().await;
        state.config.session.current_user = None;

        let result =
            handle_addfeed(&state, "Blog", "https://example.com/rss", &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn test_addfeed_rejects_bad_url() {
        let (state, _dir) = setup().await;

        let result = handle_addfeed(&state, "Blog", "ftp://example.com/rss", &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_addfeed_duplicate_url() {
        let (state, _dir) = setup().await;
        handle_addfeed(&state, "Blog", "https://example.com/rss", &mut Vec::new())
            .await
            .unwrap();

        let result =
            handle_addfeed(&state, "Again", "https://example.com/rss", &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_feeds_lists_owner() {
        let (state, _dir) = setup().await;

        let mut out = Vec::new();
        handle_feeds(&state, &mut out).await.unwrap();
        assert_eq!(output(out), "No feeds registered.\n");

        handle_addfeed(&state, "Blog", "https://example.com/rss", &mut Vec::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        handle_feeds(&state, &mut out).await.unwrap();
        assert_eq!(
            output(out),
            "* Blog\n  URL: https://example.com/rss\n  Added by: alice\n"
        );
    }

    #[tokio::test]
    async fn test_follow_and_unfollow() {
        let (mut state, _dir) = setup().await;
        handle_addfeed(&state, "Blog", "https://example.com/rss", &mut Vec::new())
            .await
            .unwrap();

        state.config.session.current_user = Some("bob".to_string());

        let mut out = Vec::new();
        handle_follow(&state, "https://example.com/rss", &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "bob now follows Blog\n");

        let again = handle_follow(&state, "https://example.com/rss", &mut Vec::new()).await;
        assert!(matches!(again, Err(GatorError::Validation(_))));

        let mut out = Vec::new();
        handle_unfollow(&state, "https://example.com/rss", &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "bob unfollowed Blog\n");

        let mut out = Vec::new();
        handle_unfollow(&state, "https://example.com/rss", &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "bob was not following Blog\n");

        let mut out = Vec::new();
        handle_following(&state, &mut out).await.unwrap();
        assert_eq!(output(out), "bob follows no feeds.\n");
    }

    #[tokio::test]
    async fn test_follow_unknown_feed() {
        let (state, _dir) = setup().await;

        let result = handle_follow(&state, "https://nowhere.example/rss", &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::NotFound(_))));

        let result = handle_unfollow(&state, "https://nowhere.example/rss", &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_browse() {
        let (state, _dir) = setup().await;
        handle_addfeed(&state, "Blog", "https://example.com/rss", &mut Vec::new())
            .await
            .unwrap();
        let feed = FeedRepository::new(state.db.pool())
            .get_by_url("https://example.com/rss")
            .await
            .unwrap()
            .unwrap();

        let posts = PostRepository::new(state.db.pool());
        for day in 1..=3 {
            let post = NewPost::new(
                feed.id,
                format!("Day {day}"),
                format!("https://example.com/{day}"),
                Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            )
            .with_description(format!("Post for day {day}"));
            posts.create_if_absent(&post).await.unwrap();
        }

        let mut out = Vec::new();
        handle_browse(&state, DEFAULT_BROWSE_LIMIT, &mut out)
            .await
            .unwrap();
        let text = output(out);

        assert!(text.contains("2024-01-03 12:00 UTC from Blog"));
        assert!(text.contains("--- Day 3 ---"));
        assert!(text.contains("--- Day 2 ---"));
        assert!(!text.contains("Day 1"));
        assert!(text.find("Day 3").unwrap() < text.find("Day 2").unwrap());
    }

    #[tokio::test]
    async fn test_browse_empty_and_invalid_limit() {
        let (state, _dir) = setup().await;

        let mut out = Vec::new();
        handle_browse(&state, 5, &mut out).await.unwrap();
        assert!(output(out).starts_with("No posts yet."));

        let result = handle_browse(&state, 0, &mut Vec::new()).await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }
}
