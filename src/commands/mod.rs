//! Command-line interface for Gator.
//!
//! Each subcommand has a handler that writes human-readable output to a
//! `std::io::Write`, so handlers can be driven from tests.

mod agg;
mod feeds;
mod session;
mod users;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

pub use agg::handle_agg;
pub use feeds::{
    handle_addfeed, handle_browse, handle_feeds, handle_follow, handle_following,
    handle_unfollow, DEFAULT_BROWSE_LIMIT,
};
pub use session::require_user;
pub use users::{handle_login, handle_register, handle_reset, handle_users};

use crate::config::Config;
use crate::db::Database;
use crate::shutdown::Shutdown;
use crate::Result;

/// Gator, a command-line RSS aggregator.
#[derive(Parser, Debug)]
#[command(name = "gator", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: ~/.gatorconfig.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a user and log in as them
    Register {
        /// User name
        name: String,
    },
    /// Log in as an existing user
    Login {
        /// User name
        name: String,
    },
    /// List all users
    Users,
    /// Delete all users, feeds, follows and posts
    Reset,
    /// Register a feed and follow it
    Addfeed {
        /// Display name of the feed
        name: String,
        /// Feed URL
        url: String,
    },
    /// List all feeds
    Feeds,
    /// Follow a registered feed
    Follow {
        /// Feed URL
        url: String,
    },
    /// List the feeds you follow
    Following,
    /// Stop following a feed
    Unfollow {
        /// Feed URL
        url: String,
    },
    /// Show the newest posts from followed feeds
    Browse {
        /// Maximum number of posts
        #[arg(default_value_t = DEFAULT_BROWSE_LIMIT)]
        limit: u32,
    },
    /// Poll feeds forever, one per interval (e.g. 30s, 1m, 1h30m)
    Agg {
        /// Time between requests
        interval: String,
    },
}

/// Context passed to every command.
pub struct State {
    /// Loaded configuration.
    pub config: Config,
    /// Where the configuration is persisted.
    pub config_path: PathBuf,
    /// Open database.
    pub db: Arc<Database>,
}

impl State {
    /// Create a new command context.
    pub fn new(config: Config, config_path: PathBuf, db: Database) -> Self {
        Self {
            config,
            config_path,
            db: Arc::new(db),
        }
    }
}

/// Run a command against `state`, writing its output to `out`.
pub async fn run<W: Write>(
    state: &mut State,
    command: Command,
    shutdown: Shutdown,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Register { name } => handle_register(state, &name, out).await,
        Command::Login { name } => handle_login(state, &name, out).await,
        Command::Users => handle_users(state, out).await,
        Command::Reset => handle_reset(state, out).await,
        Command::Addfeed { name, url } => handle_addfeed(state, &name, &url, out).await,
        Command::Feeds => handle_feeds(state, out).await,
        Command::Follow { url } => handle_follow(state, &url, out).await,
        Command::Following => handle_following(state, out).await,
        Command::Unfollow { url } => handle_unfollow(state, &url, out).await,
        Command::Browse { limit } => handle_browse(state, limit, out).await,
        Command::Agg { interval } => handle_agg(state, &interval, shutdown, out).await,
    }
}
