//! Gator - a command-line RSS aggregator.
//!
//! Users register feeds, follow them, and browse the newest posts. The
//! `agg` command polls one feed per interval and stores new items.

pub mod commands;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod shutdown;

pub use commands::{Cli, Command, State};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{GatorError, Result};
pub use feed::{FeedFetcher, FeedPoller, IngestSummary, Ingestor};
pub use shutdown::Shutdown;
