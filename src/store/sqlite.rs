//! Reference `EventStore` backed by a local SQLite file.
//!
//! Plays the server role: it stamps `occurred_at`, validates every transition
//! inside an IMMEDIATE transaction and answers the aggregate head count.

use super::{EventQuery, EventStore, TransitionOutcome};
use crate::core::presence::next_status;
use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::action::Action;
use crate::models::event::OccupancyEvent;
use crate::models::location::Location;
use crate::models::presence::PresenceStatus;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::TransactionBehavior;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub struct SqliteEventStore {
    pool: Mutex<DbPool>,
    user_id: String,
    aggregate_enabled: bool,
}

impl SqliteEventStore {
    /// Open (and migrate) the database at `path`, acting as `user_id`.
    pub fn open(path: &str, user_id: impl Into<String>) -> AppResult<Self> {
        Self::from_pool(DbPool::new(path)?, user_id)
    }

    pub fn from_pool(pool: DbPool, user_id: impl Into<String>) -> AppResult<Self> {
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
            user_id: user_id.into(),
            aggregate_enabled: true,
        })
    }

    /// Disable the aggregate endpoint to exercise the client-side fallback.
    pub fn with_aggregate(mut self, enabled: bool) -> Self {
        self.aggregate_enabled = enabled;
        self
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, DbPool>> {
        self.pool
            .lock()
            .map_err(|_| AppError::Other("event store connection poisoned".into()))
    }

    /// Append an event as-is, bypassing transition checks.
    /// Used to import historical logs; ids are assigned here.
    pub fn append_raw(&self, event: &OccupancyEvent) -> AppResult<OccupancyEvent> {
        let pool = self.lock()?;
        queries::insert_event(&pool.conn, event)
    }

    /// Run `func` against the underlying connection (maintenance commands).
    pub fn with_pool<F, T>(&self, func: F) -> AppResult<T>
    where
        F: FnOnce(&mut DbPool) -> AppResult<T>,
    {
        let mut pool = self.lock()?;
        func(&mut pool)
    }

    fn do_transition(&self, action: Action, location: Location) -> AppResult<TransitionOutcome> {
        let mut pool = self.lock()?;
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let last = queries::last_event_for_user(&tx, &self.user_id)?;
        let current = match &last {
            Some(ev) if ev.action.is_check_in() => PresenceStatus::CheckedIn,
            _ => PresenceStatus::Away,
        };

        let new_state = match next_status(current, action) {
            Some(s) => s,
            None => {
                return Err(match (&last, action) {
                    (Some(open), Action::CheckIn) => AppError::rejected(
                        "already_checked_in",
                        format!(
                            "Already checked in at {} since {}",
                            open.location,
                            open.local_time_str()
                        ),
                    ),
                    _ => AppError::rejected("not_checked_in", "Not checked in anywhere"),
                });
            }
        };

        let opened = match (&last, action) {
            (Some(open), Action::CheckOut) if open.location != location => {
                return Err(AppError::rejected(
                    "location_mismatch",
                    format!("Checked in at {}, not at {}", open.location, location),
                ));
            }
            (Some(open), Action::CheckOut) => Some(open.occurred_at),
            _ => None,
        };

        // server clock; never stamp before the user's previous event
        let now = match &last {
            Some(prev) => Utc::now().max(prev.occurred_at),
            None => Utc::now(),
        };

        let event = queries::insert_event(
            &tx,
            &OccupancyEvent::scan(self.user_id.clone(), location, action, now),
        )?;

        let duration_seconds = opened.map(|start| (now - start).num_seconds().max(0));
        let duration_minutes = duration_seconds.map(|s| s / 60);

        ttlog(
            &tx,
            "transition",
            &self.user_id,
            &format!("{} at {}", action.as_str(), location),
        )?;
        tx.commit()?;

        info!(
            user = %self.user_id,
            action = action.as_str(),
            location = location.code(),
            event_id = event.id,
            "transition committed"
        );

        Ok(TransitionOutcome {
            new_state,
            duration_seconds,
            duration_minutes,
            event,
        })
    }

    fn do_correction(&self, duration_minutes: i64) -> AppResult<OccupancyEvent> {
        if duration_minutes <= 0 {
            return Err(AppError::rejected(
                "invalid_duration",
                format!("Duration must be positive, got {duration_minutes}"),
            ));
        }

        let mut pool = self.lock()?;
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let open = match queries::last_event_for_user(&tx, &self.user_id)? {
            Some(ev) if ev.action.is_check_in() => ev,
            _ => {
                return Err(AppError::rejected(
                    "no_open_session",
                    "No open session to correct",
                ));
            }
        };

        let now = Utc::now().max(open.occurred_at);
        let event = queries::insert_event(
            &tx,
            &OccupancyEvent::correction(
                self.user_id.clone(),
                open.location,
                now,
                duration_minutes,
            ),
        )?;

        ttlog(
            &tx,
            "correction",
            &self.user_id,
            &format!(
                "Closed session opened {} at {} with {} min",
                open.local_time_str(),
                open.location,
                duration_minutes
            ),
        )?;
        tx.commit()?;

        info!(
            user = %self.user_id,
            duration_minutes,
            event_id = event.id,
            "correction committed"
        );
        Ok(event)
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn transition(
        &self,
        action: Action,
        location: Location,
    ) -> AppResult<TransitionOutcome> {
        let result = self.do_transition(action, location);
        if let Err(e) = &result {
            debug!(user = %self.user_id, error = %e, "transition refused");
        }
        result
    }

    async fn correction_commit(&self, duration_minutes: i64) -> AppResult<OccupancyEvent> {
        self.do_correction(duration_minutes)
    }

    async fn query_events(&self, query: &EventQuery) -> AppResult<Vec<OccupancyEvent>> {
        let pool = self.lock()?;
        queries::load_events(&pool.conn, query)
    }

    async fn aggregate_current_occupancy(&self, location: Location) -> AppResult<u32> {
        if !self.aggregate_enabled {
            warn!(location = location.code(), "aggregate endpoint disabled");
            return Err(AppError::Unavailable(
                "aggregate occupancy endpoint disabled".into(),
            ));
        }

        let pool = self.lock()?;
        queries::current_occupancy(&pool.conn, location)
    }
}
