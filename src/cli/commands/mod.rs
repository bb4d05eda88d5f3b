pub mod config;
pub mod correct;
pub mod db;
pub mod events;
pub mod init;
pub mod log;
pub mod occupancy;
pub mod scan;
pub mod status;
pub mod timeline;
pub mod watch;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::location::Location;
use crate::store::SqliteEventStore;

/// Open the configured store as the configured user.
pub(crate) fn open_store(cfg: &Config) -> AppResult<SqliteEventStore> {
    Ok(SqliteEventStore::open(&cfg.database, cfg.user_id.clone())?
        .with_aggregate(cfg.server_aggregate))
}

/// Resolve `--loc`, falling back to the configured default location.
pub(crate) fn resolve_location(code: Option<&String>, cfg: &Config) -> AppResult<Location> {
    let code = code.unwrap_or(&cfg.default_location);
    Location::from_code(code).ok_or_else(|| {
        AppError::InvalidLocation(format!(
            "'{}'. Use M (Main), A (Annex), L (Lab) or S (Studio)",
            code
        ))
    })
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::Other(e.to_string()))?;
    println!("{json}");
    Ok(())
}
