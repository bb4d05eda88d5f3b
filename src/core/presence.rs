//! AWAY / CHECKED_IN presence machine.
//!
//! Presence is always derived from the log: a user is present iff their
//! chronologically last event is a check-in. The machine itself only says
//! which transitions exist; the store applies it against persisted state.

use crate::errors::AppResult;
use crate::models::action::Action;
use crate::models::event::OccupancyEvent;
use crate::models::presence::{PresenceState, PresenceStatus};
use crate::store::{EventQuery, EventStore, TransitionOutcome};
use tracing::debug;

/// Legal transitions: `AWAY --CheckIn--> CHECKED_IN`, `CHECKED_IN --CheckOut--> AWAY`.
pub fn next_status(current: PresenceStatus, action: Action) -> Option<PresenceStatus> {
    match (current, action) {
        (PresenceStatus::Away, Action::CheckIn) => Some(PresenceStatus::CheckedIn),
        (PresenceStatus::CheckedIn, Action::CheckOut) => Some(PresenceStatus::Away),
        _ => None,
    }
}

/// Derive a user's presence from an event list in any order.
/// Events of other users are ignored; out-of-sequence logs are tolerated.
pub fn derive_presence(user_id: &str, events: &[OccupancyEvent]) -> PresenceState {
    let last = events
        .iter()
        .filter(|e| e.user_id == user_id)
        .max_by(|a, b| a.chrono_cmp(b));

    match last {
        Some(ev) => PresenceState {
            user_id: user_id.to_string(),
            location: Some(ev.location),
            is_present: ev.action.is_check_in(),
            since: Some(ev.occurred_at),
        },
        None => PresenceState::away(user_id),
    }
}

/// Fetch the caller's log and derive their presence.
pub async fn load_presence<S>(store: &S) -> AppResult<PresenceState>
where
    S: EventStore + ?Sized,
{
    let user = store.user_id().to_string();
    let events = store.query_events(&EventQuery::for_user(user.clone())).await?;
    Ok(derive_presence(&user, &events))
}

/// Locally cached presence of one user.
///
/// Only ever moved by a successful store response or a fresh log fetch;
/// a rejected transition leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    state: Option<PresenceState>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&PresenceState> {
        self.state.as_ref()
    }

    /// Unknown presence counts as not present.
    pub fn is_present(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_present)
    }

    pub fn replace(&mut self, state: PresenceState) {
        self.state = Some(state);
    }

    pub fn apply_outcome(&mut self, outcome: &TransitionOutcome) {
        self.apply_event(&outcome.event);
    }

    /// Fold one store-confirmed event into the cache.
    pub fn apply_event(&mut self, event: &OccupancyEvent) {
        if let Some(state) = &self.state
            && state.since.is_some_and(|since| since > event.occurred_at)
        {
            debug!(event_id = event.id, "ignoring event older than cached presence");
            return;
        }

        self.state = Some(PresenceState {
            user_id: event.user_id.clone(),
            location: Some(event.location),
            is_present: event.action.is_check_in(),
            since: Some(event.occurred_at),
        });
    }

    /// Re-derive from the store, replacing whatever was cached.
    pub async fn refresh<S>(&mut self, store: &S) -> AppResult<&PresenceState>
    where
        S: EventStore + ?Sized,
    {
        let state = load_presence(store).await?;
        Ok(self.state.insert(state))
    }
}
