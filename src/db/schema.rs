//! Database schema and migrations for Gator.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations (SQLite).
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          BLOB PRIMARY KEY,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    name        TEXT NOT NULL UNIQUE
);
"#,
    // v2: feeds, one owner each, polled round-robin by last_fetched_at
    r#"
CREATE TABLE feeds (
    id               BLOB PRIMARY KEY,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    name             TEXT NOT NULL,
    url              TEXT NOT NULL UNIQUE,
    user_id          BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    last_fetched_at  TEXT
);

CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
"#,
    // v3: follows
    r#"
CREATE TABLE feed_follows (
    id          BLOB PRIMARY KEY,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    user_id     BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    UNIQUE (user_id, feed_id)
);
"#,
    // v4: posts, unique per (feed, link)
    r#"
CREATE TABLE posts (
    id            BLOB PRIMARY KEY,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    title         TEXT NOT NULL,
    url           TEXT NOT NULL,
    description   TEXT,
    published_at  TEXT NOT NULL,
    feed_id       BLOB NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    UNIQUE (feed_id, url)
);

CREATE INDEX idx_posts_published_at ON posts(published_at);
"#,
];

/// Database migrations (PostgreSQL).
#[cfg(not(feature = "sqlite"))]
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          UUID PRIMARY KEY,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL,
    name        TEXT NOT NULL UNIQUE
);
"#,
    // v2: feeds, one owner each, polled round-robin by last_fetched_at
    r#"
CREATE TABLE feeds (
    id               UUID PRIMARY KEY,
    created_at       TIMESTAMPTZ NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL,
    name             TEXT NOT NULL,
    url              TEXT NOT NULL UNIQUE,
    user_id          UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    last_fetched_at  TIMESTAMPTZ
);

CREATE INDEX idx_feeds_last_fetched_at ON feeds(last_fetched_at);
"#,
    // v3: follows
    r#"
CREATE TABLE feed_follows (
    id          UUID PRIMARY KEY,
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL,
    user_id     UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     UUID NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    UNIQUE (user_id, feed_id)
);
"#,
    // v4: posts, unique per (feed, link)
    r#"
CREATE TABLE posts (
    id            UUID PRIMARY KEY,
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL,
    title         TEXT NOT NULL,
    url           TEXT NOT NULL,
    description   TEXT,
    published_at  TIMESTAMPTZ NOT NULL,
    feed_id       UUID NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    UNIQUE (feed_id, url)
);

CREATE INDEX idx_posts_published_at ON posts(published_at);
"#,
];
