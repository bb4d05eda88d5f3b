use crate::cli::commands::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::presence::load_presence;
use crate::core::stale::{ArmOutcome, StaleSessionDetector};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::formatting::mins2readable;
use crate::utils::time::local_datetime;
use chrono::Utc;

/// Handle the `correct` command: one-shot run of the stale-session workflow.
///
/// Only a session that has been open for at least the stale threshold can be
/// corrected, and only once.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Correct { minutes } = cmd else {
        return Ok(());
    };

    let store = open_store(cfg)?;
    let presence = load_presence(&store).await?;
    let (mut detector, _due_rx) =
        StaleSessionDetector::new(cfg.stale_threshold()?, cfg.correction_bounds());

    match detector.arm(&presence, Utc::now()) {
        ArmOutcome::Prompting => {}
        ArmOutcome::Scheduled { due_at } => {
            return Err(AppError::Validation(format!(
                "session is not stale yet; corrections open at {}",
                local_datetime(&due_at)
            )));
        }
        ArmOutcome::Idle | ArmOutcome::AlreadyCorrected => {
            return Err(AppError::rejected(
                "no_open_session",
                "You are not checked in anywhere",
            ));
        }
        ArmOutcome::Suppressed => {
            return Err(AppError::Other("correction prompt already open".into()));
        }
    }

    let minutes = detector.validate_minutes(minutes)?;
    let event = detector.submit(&store, minutes).await?;

    success(format!(
        "Session at {} closed after {} (correction #{})",
        event.location,
        mins2readable(minutes, false),
        event.id
    ));
    Ok(())
}
