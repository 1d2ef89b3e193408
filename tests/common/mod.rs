//! Test helpers for integration tests.
//!
//! Provides a local feed server and database setup helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use gator::config::FetchConfig;
use gator::db::{NewUser, UserRepository};
use gator::feed::{Feed, FeedRepository, NewFeed};
use gator::{Database, FeedFetcher};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Routes {
    responses: HashMap<String, (StatusCode, String)>,
    delays: HashMap<String, Duration>,
    hits: Vec<String>,
}

/// A local HTTP server serving canned feed documents.
#[derive(Clone)]
pub struct FeedServer {
    addr: SocketAddr,
    routes: Arc<Mutex<Routes>>,
}

impl FeedServer {
    /// Start a server on an ephemeral loopback port.
    pub async fn start() -> Self {
        let routes = Arc::new(Mutex::new(Routes::default()));
        let app = Router::new()
            .fallback(serve_route)
            .with_state(routes.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, routes }
    }

    /// Full URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Serve `body` with status 200 at `path`.
    pub fn set_feed(&self, path: &str, body: impl Into<String>) {
        self.set_response(path, StatusCode::OK, body);
    }

    /// Serve `body` with `status` at `path`.
    pub fn set_response(&self, path: &str, status: StatusCode, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .responses
            .insert(path.to_string(), (status, body.into()));
    }

    /// Serve `body` at `path`, but only after `delay`.
    pub fn set_slow_feed(&self, path: &str, body: impl Into<String>, delay: Duration) {
        self.set_feed(path, body);
        self.routes
            .lock()
            .unwrap()
            .delays
            .insert(path.to_string(), delay);
    }

    /// Requested paths, in order.
    pub fn hits(&self) -> Vec<String> {
        self.routes.lock().unwrap().hits.clone()
    }

    /// Wait until at least `count` requests have been served.
    pub async fn wait_for_hits(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
        while self.hits().len() < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} request(s)"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn serve_route(State(routes): State<Arc<Mutex<Routes>>>, uri: Uri) -> Response {
    let (response, delay) = {
        let mut routes = routes.lock().unwrap();
        routes.hits.push(uri.path().to_string());
        (
            routes.responses.get(uri.path()).cloned(),
            routes.delays.get(uri.path()).copied(),
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match response {
        Some((status, body)) => (
            status,
            [(header::CONTENT_TYPE, "application/rss+xml")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "<html><body>Not found</body></html>").into_response(),
    }
}

/// Build an RSS document with `(title, link, pub_date)` items.
pub fn rss_document(title: &str, items: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel>\
         <title>{title}</title><link>https://example.com/</link>\
         <description>{title} feed</description>"
    );
    for (item_title, link, pub_date) in items {
        xml.push_str(&format!(
            "<item><title>{item_title}</title><link>{link}</link>\
             <description>About {item_title}</description><pubDate>{pub_date}</pubDate></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

/// Setup an in-memory test database.
pub async fn setup_test_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().await.unwrap())
}

/// Create a test user and return the user ID.
pub async fn create_test_user(db: &Database, name: &str) -> uuid::Uuid {
    UserRepository::new(db.pool())
        .create(&NewUser::new(name))
        .await
        .unwrap()
        .id
}

/// Register a feed owned by `user_id`.
pub async fn create_test_feed(db: &Database, user_id: uuid::Uuid, name: &str, url: &str) -> Feed {
    FeedRepository::new(db.pool())
        .create(&NewFeed::new(name, url, user_id))
        .await
        .unwrap()
}

/// A fetcher with short timeouts.
pub fn test_fetcher() -> FeedFetcher {
    let config = FetchConfig {
        connect_timeout_secs: 2,
        total_timeout_secs: 5,
        ..Default::default()
    };
    FeedFetcher::new(&config).unwrap()
}
