//! One open scanner surface: decode callbacks in, at most one transition per
//! physical scan out.

use crate::core::guard::ScanGuard;
use crate::core::presence::PresenceTracker;
use crate::errors::{AppError, AppResult};
use crate::models::action::Action;
use crate::models::location::Location;
use crate::models::presence::PresenceState;
use crate::store::{EventStore, TransitionOutcome};
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};

static PAYLOAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rpresence:([a-z]+)(?::(in|out|check-?in|check-?out))?$")
        .expect("payload pattern is a valid regex")
});

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// What a decoded payload asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    pub location: Location,
    /// `None`: toggle based on the cached presence.
    pub action: Option<Action>,
}

/// Payload format: `rpresence:<location>[:<in|out>]`, case-insensitive.
pub fn parse_payload(payload: &str) -> AppResult<ScanRequest> {
    let payload = payload.trim();
    let caps = PAYLOAD_RE
        .captures(payload)
        .ok_or_else(|| AppError::UnrecognizedPayload(payload.to_string()))?;

    let location = caps
        .get(1)
        .and_then(|m| Location::from_code(m.as_str()))
        .ok_or_else(|| AppError::UnrecognizedPayload(payload.to_string()))?;

    let action = match caps.get(2) {
        Some(m) => Some(
            Action::from_code(m.as_str())
                .ok_or_else(|| AppError::UnrecognizedPayload(payload.to_string()))?,
        ),
        None => None,
    };

    Ok(ScanRequest { location, action })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Another decode of this session is waiting on the store.
    InFlight,
    /// Same payload again right after it was handled.
    Duplicate,
    /// The session was torn down.
    Closed,
}

#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Transitioned(TransitionOutcome),
    Dropped(DropReason),
}

pub struct ScannerSession<S: EventStore + ?Sized> {
    id: u64,
    store: Arc<S>,
    guard: ScanGuard,
    presence: Mutex<PresenceTracker>,
    transition_timeout: Duration,
    debounce: Duration,
    last_scan: Mutex<Option<(String, Instant)>>,
}

impl<S: EventStore + ?Sized> ScannerSession<S> {
    pub fn new(store: Arc<S>, transition_timeout: Duration, debounce: Duration) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "scanner session opened");
        Self {
            id,
            store,
            guard: ScanGuard::new(),
            presence: Mutex::new(PresenceTracker::new()),
            transition_timeout,
            debounce,
            last_scan: Mutex::new(None),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn guard(&self) -> &ScanGuard {
        &self.guard
    }

    fn tracker(&self) -> MutexGuard<'_, PresenceTracker> {
        self.presence.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn last_scan(&self) -> MutexGuard<'_, Option<(String, Instant)>> {
        self.last_scan.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Cached presence, if loaded.
    pub fn presence(&self) -> Option<PresenceState> {
        self.tracker().current().cloned()
    }

    /// Reload presence from the log, replacing the cache.
    pub async fn refresh_presence(&self) -> AppResult<PresenceState> {
        let state = crate::core::presence::load_presence(self.store.as_ref()).await?;
        self.tracker().replace(state.clone());
        Ok(state)
    }

    fn is_duplicate(&self, payload: &str) -> bool {
        match self.last_scan().as_ref() {
            Some((last, at)) => last == payload && at.elapsed() < self.debounce,
            None => false,
        }
    }

    fn remember(&self, payload: &str) {
        *self.last_scan() = Some((payload.to_string(), Instant::now()));
    }

    /// Handle one decode callback.
    ///
    /// Only a completed transition opens the duplicate window, so a rescan
    /// after a failure goes through.
    ///
    /// The guard is held until the store answers (or the timeout fires) and is
    /// released on every path, including unrecognized payloads.
    pub async fn on_decode(&self, payload: &str) -> AppResult<ScanOutcome> {
        if self.guard.is_closed() {
            debug!(session = self.id, "decode after teardown ignored");
            return Ok(ScanOutcome::Dropped(DropReason::Closed));
        }

        let Some(_permit) = self.guard.try_lock() else {
            debug!(session = self.id, "decode dropped: scan in flight");
            return Ok(ScanOutcome::Dropped(DropReason::InFlight));
        };

        let payload = payload.trim();
        if self.is_duplicate(payload) {
            debug!(session = self.id, "decode dropped: duplicate frame");
            return Ok(ScanOutcome::Dropped(DropReason::Duplicate));
        }

        let request = parse_payload(payload)?;

        let action = request.action.unwrap_or_else(|| {
            if self.tracker().is_present() {
                Action::CheckOut
            } else {
                Action::CheckIn
            }
        });

        let result = match timeout(
            self.transition_timeout,
            self.store.transition(action, request.location),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => {
                warn!(
                    session = self.id,
                    timeout_secs = self.transition_timeout.as_secs(),
                    "transition timed out"
                );
                Err(AppError::Timeout(self.transition_timeout.as_secs()))
            }
        };

        let outcome = result?;
        self.remember(payload);
        self.tracker().apply_outcome(&outcome);
        info!(
            session = self.id,
            state = outcome.new_state.as_str(),
            "scan accepted"
        );
        Ok(ScanOutcome::Transitioned(outcome))
    }

    /// Tear down the scanner surface: the guard unlocks and late callbacks become no-ops.
    pub fn close(&self) {
        self.guard.close();
        debug!(session = self.id, "scanner session closed");
    }
}

impl<S: EventStore + ?Sized> Drop for ScannerSession<S> {
    fn drop(&mut self) {
        self.guard.close();
    }
}
