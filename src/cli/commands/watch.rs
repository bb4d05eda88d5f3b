use crate::cli::commands::open_store;
use crate::config::Config;
use crate::core::presence::PresenceTracker;
use crate::core::stale::{ArmOutcome, StaleSessionDetector};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{ask, error, info, success, warning};
use crate::utils::formatting::mins2readable;
use crate::utils::time::local_datetime;
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const REFRESH_EVERY: Duration = Duration::from_secs(60);

/// Handle the `watch` command.
///
/// Keeps the caller's presence fresh and, once the open session goes stale,
/// asks on stdin how long they actually stayed. Ends on EOF or an empty answer.
pub async fn handle(cfg: &Config) -> AppResult<()> {
    let store = open_store(cfg)?;
    let mut tracker = PresenceTracker::new();
    let threshold = cfg.stale_threshold()?;
    let (mut detector, mut due_rx) = StaleSessionDetector::new(threshold, cfg.correction_bounds());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    info(format!(
        "Watching {} (stale after {}). Ctrl-C to stop.",
        cfg.user_id,
        mins2readable(threshold.num_minutes(), false)
    ));

    loop {
        let presence = tracker.refresh(&store).await?.clone();

        match detector.arm(&presence, Utc::now()) {
            ArmOutcome::Prompting => {}
            outcome => {
                debug!(?outcome, "stale detector armed");
                tokio::select! {
                    Some(key) = due_rx.recv() => {
                        if !detector.on_due(&key) {
                            continue;
                        }
                    }
                    _ = tokio::time::sleep(REFRESH_EVERY) => continue,
                }
            }
        }

        let prompt = detector.prompt();
        let started = prompt
            .suggested_start
            .map(|t| local_datetime(&t))
            .unwrap_or_default();
        warning(format!("You have been checked in since {}.", started));

        loop {
            ask("How many minutes did you actually stay? (empty to quit)");
            let Some(line) = stdin.next_line().await? else {
                return Ok(());
            };
            if line.trim().is_empty() {
                return Ok(());
            }

            let minutes = match detector.validate_minutes(&line) {
                Ok(m) => m,
                Err(e) => {
                    error(e);
                    continue;
                }
            };

            match detector.submit(&store, minutes).await {
                Ok(event) => {
                    tracker.apply_event(&event);
                    success(format!(
                        "Session closed after {}",
                        mins2readable(minutes, false)
                    ));
                    break;
                }
                Err(e @ AppError::TransitionRejected { .. }) => {
                    // the session was closed some other way; watch again
                    error(e);
                    detector.dismiss();
                    break;
                }
                Err(e) => error(e),
            }
        }
    }
}
