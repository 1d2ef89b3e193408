use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use gator::{commands, config, Cli, Config, Database, State};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> gator::Result<()> {
    let config_path = config::resolve_path(cli.config)?;

    let mut config = Config::load_or_default(&config_path)?;
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        gator::logging::init_console_only(&config.logging.level);
    }

    config.validate()?;
    debug!("Using configuration at {}", config_path.display());

    let db = Database::open(&config.database.url).await?;
    let mut state = State::new(config, config_path, db);

    let shutdown = gator::shutdown::listen_for_signals();
    let mut stdout = std::io::stdout().lock();

    let result = commands::run(&mut state, cli.command, shutdown, &mut stdout).await;
    state.db.close().await;
    result
}
