//! Client-side contract of the occupancy event store.
//!
//! The store is the only writer of the log and the sole authority on whether
//! a check-in or check-out is legal for the currently persisted state. The
//! core never decides legality on its own: it forwards the action and reacts
//! to the outcome.

pub mod sqlite;

use crate::errors::AppResult;
use crate::models::action::Action;
use crate::models::event::OccupancyEvent;
use crate::models::location::Location;
use crate::models::presence::PresenceStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use sqlite::SqliteEventStore;

/// Filter for [`EventStore::query_events`]. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub user_id: Option<String>,
    pub location: Option<Location>,
    pub since: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn for_location(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub new_state: PresenceStatus,
    /// Only set when the transition closed a session.
    pub duration_seconds: Option<i64>,
    pub duration_minutes: Option<i64>,
    /// The event the store appended.
    pub event: OccupancyEvent,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Identity the store acts on behalf of.
    fn user_id(&self) -> &str;

    /// Atomically validate and record `action` for the caller.
    /// Rejections come back as [`crate::errors::AppError::TransitionRejected`].
    async fn transition(&self, action: Action, location: Location)
    -> AppResult<TransitionOutcome>;

    /// Close the caller's open session with an explicit, user-supplied duration.
    async fn correction_commit(&self, duration_minutes: i64) -> AppResult<OccupancyEvent>;

    /// Events matching `query`. Order is unspecified: callers sort.
    async fn query_events(&self, query: &EventQuery) -> AppResult<Vec<OccupancyEvent>>;

    /// Server-side head count for `location`. Best effort: may be unavailable.
    async fn aggregate_current_occupancy(&self, location: Location) -> AppResult<u32>;
}
