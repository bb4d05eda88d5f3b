//! Stale-session detection and the manual correction workflow.
//!
//! `WATCHING → PROMPTING → CORRECTED → WATCHING`, per user.
//!
//! Nothing is polled. Arming the detector either opens the prompt right away
//! (threshold already reached) or schedules one deferred check that fires at
//! the threshold boundary. The check is a tokio task keyed by the session it
//! was scheduled for; it is aborted whenever that session stops being the one
//! watched, and when the detector is dropped. When it fires it only posts the
//! key on a channel: the owner hands it back through [`StaleSessionDetector::on_due`].

use crate::errors::{AppError, AppResult};
use crate::models::event::OccupancyEvent;
use crate::models::presence::PresenceState;
use crate::store::EventStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::ops::RangeInclusive;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    Watching,
    Prompting,
    Corrected,
}

/// Identifies one open session: a user and the check-in that opened it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub checked_in_at: DateTime<Utc>,
}

/// What the presentation layer shows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CorrectionPrompt {
    pub visible: bool,
    pub suggested_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmOutcome {
    /// User is away: nothing to watch.
    Idle,
    /// Deferred check pending.
    Scheduled { due_at: DateTime<Utc> },
    /// Threshold already reached: prompt opened.
    Prompting,
    /// A prompt is open; re-arming is suppressed.
    Suppressed,
    /// This check-in was already corrected once.
    AlreadyCorrected,
}

struct ScheduledCheck {
    key: SessionKey,
    due_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

pub struct StaleSessionDetector {
    threshold: Duration,
    bounds: RangeInclusive<i64>,
    state: WorkflowState,
    session: Option<SessionKey>,
    corrected_for: Option<DateTime<Utc>>,
    scheduled: Option<ScheduledCheck>,
    due_tx: UnboundedSender<SessionKey>,
}

impl StaleSessionDetector {
    /// Returns the detector and the channel its deferred checks fire on.
    pub fn new(
        threshold: Duration,
        bounds: RangeInclusive<i64>,
    ) -> (Self, UnboundedReceiver<SessionKey>) {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        let detector = Self {
            threshold,
            bounds,
            state: WorkflowState::Watching,
            session: None,
            corrected_for: None,
            scheduled: None,
            due_tx,
        };
        (detector, due_rx)
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn bounds(&self) -> &RangeInclusive<i64> {
        &self.bounds
    }

    /// Session currently watched or prompted for.
    pub fn session(&self) -> Option<&SessionKey> {
        self.session.as_ref()
    }

    pub fn has_pending_check(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn prompt(&self) -> CorrectionPrompt {
        let visible = self.state == WorkflowState::Prompting;
        CorrectionPrompt {
            visible,
            suggested_start: if visible {
                self.session.as_ref().map(|k| k.checked_in_at)
            } else {
                None
            },
        }
    }

    /// (Re)arm against the latest presence. Must run inside a tokio runtime.
    pub fn arm(&mut self, presence: &PresenceState, now: DateTime<Utc>) -> ArmOutcome {
        if self.state == WorkflowState::Prompting {
            return ArmOutcome::Suppressed;
        }
        self.state = WorkflowState::Watching;

        let Some(checked_in_at) = presence.checked_in_at() else {
            self.cancel();
            self.session = None;
            return ArmOutcome::Idle;
        };

        if self.corrected_for == Some(checked_in_at) {
            self.cancel();
            self.session = None;
            return ArmOutcome::AlreadyCorrected;
        }

        let key = SessionKey {
            user_id: presence.user_id.clone(),
            checked_in_at,
        };
        // a threshold past the end of representable time never comes due
        let due_at = checked_in_at
            .checked_add_signed(self.threshold)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if now >= due_at {
            self.cancel();
            info!(user = %key.user_id, "session stale, opening correction prompt");
            self.session = Some(key);
            self.state = WorkflowState::Prompting;
            return ArmOutcome::Prompting;
        }

        if let Some(s) = &self.scheduled
            && s.key == key
            && s.due_at == due_at
        {
            return ArmOutcome::Scheduled { due_at };
        }

        self.cancel();
        let delay = (due_at - now).to_std().unwrap_or_default();
        let tx = self.due_tx.clone();
        let fire_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the owner is tearing down
            let _ = tx.send(fire_key);
        });

        debug!(user = %key.user_id, delay_secs = delay.as_secs(), "stale check scheduled");
        self.scheduled = Some(ScheduledCheck {
            key: key.clone(),
            due_at,
            handle,
        });
        self.session = Some(key);
        ArmOutcome::Scheduled { due_at }
    }

    /// Change the threshold and re-arm.
    pub fn set_threshold(
        &mut self,
        threshold: Duration,
        presence: &PresenceState,
        now: DateTime<Utc>,
    ) -> ArmOutcome {
        self.threshold = threshold;
        self.arm(presence, now)
    }

    /// A deferred check fired. Opens the prompt only if `key` is still the
    /// watched session. Returns whether the prompt opened.
    pub fn on_due(&mut self, key: &SessionKey) -> bool {
        if self.state != WorkflowState::Watching
            || self.session.as_ref() != Some(key)
            || self.corrected_for == Some(key.checked_in_at)
        {
            debug!(user = %key.user_id, "stale check for an outdated session ignored");
            return false;
        }

        self.scheduled = None;
        self.state = WorkflowState::Prompting;
        info!(user = %key.user_id, "session stale, opening correction prompt");
        true
    }

    /// Parse and bound-check the manual duration.
    pub fn validate_minutes(&self, input: &str) -> AppResult<i64> {
        let minutes: i64 = input.trim().parse().map_err(|_| {
            AppError::Validation(format!("'{}' is not a whole number of minutes", input.trim()))
        })?;
        self.check_bounds(minutes)?;
        Ok(minutes)
    }

    fn check_bounds(&self, minutes: i64) -> AppResult<()> {
        if self.bounds.contains(&minutes) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "duration must be between {} and {} minutes, got {}",
                self.bounds.start(),
                self.bounds.end(),
                minutes
            )))
        }
    }

    /// Commit the correction. On failure the prompt stays open for another try;
    /// on success the workflow is `Corrected` until the next `arm`.
    pub async fn submit<S>(&mut self, store: &S, minutes: i64) -> AppResult<OccupancyEvent>
    where
        S: EventStore + ?Sized,
    {
        if self.state != WorkflowState::Prompting {
            return Err(AppError::Validation("no correction prompt is open".into()));
        }
        self.check_bounds(minutes)?;

        match store.correction_commit(minutes).await {
            Ok(event) => {
                self.corrected_for = self.session.take().map(|k| k.checked_in_at);
                self.state = WorkflowState::Corrected;
                info!(event_id = event.id, minutes, "stale session corrected");
                Ok(event)
            }
            Err(e) => {
                warn!(error = %e, "correction failed, prompt stays open");
                Err(e)
            }
        }
    }

    /// Close the prompt without committing anything. The session is watched
    /// again on the next `arm`.
    pub fn dismiss(&mut self) {
        if self.state == WorkflowState::Prompting {
            debug!("correction prompt dismissed");
            self.state = WorkflowState::Watching;
            self.session = None;
        }
    }

    /// Abort the pending deferred check, if any.
    pub fn cancel(&mut self) {
        if let Some(s) = self.scheduled.take() {
            s.handle.abort();
            debug!(user = %s.key.user_id, "stale check cancelled");
        }
    }
}

impl Drop for StaleSessionDetector {
    fn drop(&mut self) {
        self.cancel();
    }
}
