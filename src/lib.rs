//! rPresence library root.
//! Exposes the CLI parser, the high-level run() function and the presence,
//! occupancy and timeline core.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod store;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::{AppError, AppResult};

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Scan { .. } => cli::commands::scan::handle(&cli.command, cfg).await,
        Commands::Status { .. } => cli::commands::status::handle(&cli.command, cfg).await,
        Commands::Occupancy { .. } => cli::commands::occupancy::handle(&cli.command, cfg).await,
        Commands::Timeline { .. } => cli::commands::timeline::handle(&cli.command, cfg).await,
        Commands::Events { .. } => cli::commands::events::handle(&cli.command, cfg).await,
        Commands::Correct { .. } => cli::commands::correct::handle(&cli.command, cfg).await,
        Commands::Watch => cli::commands::watch::handle(cfg).await,
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // config is loaded once; command-line overrides win
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(user) = &cli.user {
        cfg.user_id = user.clone();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Other(format!("failed to start async runtime: {e}")))?;

    runtime.block_on(dispatch(&cli, &cfg))
}
