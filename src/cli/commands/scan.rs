use crate::cli::commands::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::scanner::{DropReason, ScanOutcome, ScannerSession};
use crate::errors::{AppError, AppResult};
use crate::models::presence::PresenceStatus;
use crate::ui::messages::{error, info, success, warning};
use crate::utils::formatting::mins2readable;
use crate::utils::time::{format_seconds, local_hhmm};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Handle the `scan` command.
///
/// Every payload is delivered to the same scanner session as a separate decode
/// callback. They run concurrently, spaced by `--gap-ms`.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Scan { payloads, gap_ms } = cmd else {
        return Ok(());
    };

    let store = Arc::new(open_store(cfg)?);
    let session = ScannerSession::new(store, cfg.transition_timeout(), cfg.scan_debounce());
    session.refresh_presence().await?;

    let gap_ms = *gap_ms;
    let session_ref = &session;
    let decodes = payloads.iter().enumerate().map(move |(i, payload)| {
        let session = session_ref;
        let delay = Duration::from_millis(gap_ms.saturating_mul(i as u64));
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (payload.as_str(), session.on_decode(payload).await)
        }
    });
    let results = join_all(decodes).await;
    session.close();

    let total = results.len();
    let mut failed = 0;
    for (payload, result) in results {
        match result {
            Ok(ScanOutcome::Transitioned(outcome)) => {
                let ev = &outcome.event;
                match outcome.new_state {
                    PresenceStatus::CheckedIn => success(format!(
                        "Checked in at {} ({})",
                        ev.location,
                        local_hhmm(&ev.occurred_at)
                    )),
                    PresenceStatus::Away => {
                        let stayed = match (outcome.duration_minutes, outcome.duration_seconds) {
                            (Some(m), _) if m > 0 => format!(", stayed {}", mins2readable(m, false)),
                            (_, Some(s)) => format!(", stayed {}", format_seconds(s)),
                            _ => String::new(),
                        };
                        success(format!(
                            "Checked out of {} ({}){}",
                            ev.location,
                            local_hhmm(&ev.occurred_at),
                            stayed
                        ))
                    }
                }
            }
            Ok(ScanOutcome::Dropped(reason)) => {
                let why = match reason {
                    DropReason::InFlight => "another scan is in progress",
                    DropReason::Duplicate => "duplicate frame",
                    DropReason::Closed => "scanner closed",
                };
                info(format!("Ignored '{}': {}", payload, why));
            }
            Err(e) => {
                if e.is_transient() {
                    warning(format!("'{}': {} (scan again to retry)", payload, e));
                } else {
                    error(format!("'{}': {}", payload, e));
                }
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(AppError::Other(format!("{} of {} scans failed", failed, total)));
    }
    Ok(())
}
