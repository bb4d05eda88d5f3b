#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rpresence::core::occupancy::fold_occupancy;
use rpresence::core::presence::{derive_presence, next_status};
use rpresence::errors::{AppError, AppResult};
use rpresence::models::action::Action;
use rpresence::models::event::OccupancyEvent;
use rpresence::models::location::Location;
use rpresence::store::{EventQuery, EventStore, SqliteEventStore, TransitionOutcome};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub fn rpr() -> Command {
    let mut cmd = cargo_bin_cmd!("rpresence");
    cmd.env("RPRESENCE_LOG", "off");
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rpresence.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create the schema through the CLI, like a user would
pub fn init_db(db_path: &str) {
    rpr()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// Fixed reference instant used by the pure tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

pub fn ev(
    id: i64,
    user: &str,
    location: Location,
    action: Action,
    at: DateTime<Utc>,
) -> OccupancyEvent {
    OccupancyEvent::scan(user, location, action, at).with_id(id)
}

/// Fresh database file inside its own temp dir; the dir goes away on drop
pub fn temp_db(name: &str) -> (TempDir, String) {
    let dir = tempfile::Builder::new().prefix(name).tempdir().unwrap();
    let db_path = dir.path().join("rpresence.sqlite").to_string_lossy().to_string();
    (dir, db_path)
}

/// Sqlite store on a fresh file, acting as `user`
pub fn sqlite_store(name: &str, user: &str) -> (TempDir, SqliteEventStore) {
    let (dir, db_path) = temp_db(name);
    (dir, SqliteEventStore::open(&db_path, user).unwrap())
}

/// Seed a check-in `ago` in the past, bypassing the server clock
pub fn seed_check_in(store: &SqliteEventStore, user: &str, location: Location, ago: Duration) {
    store
        .append_raw(&OccupancyEvent::scan(
            user,
            location,
            Action::CheckIn,
            Utc::now() - ago,
        ))
        .unwrap();
}

/// In-memory store with a controllable response time.
///
/// Applies the same legality rules as the SQLite store and counts every
/// `transition` call it receives.
pub struct MockStore {
    user: String,
    events: Mutex<Vec<OccupancyEvent>>,
    delay: std::time::Duration,
    aggregate: bool,
    transitions: AtomicUsize,
}

impl MockStore {
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            events: Mutex::new(Vec::new()),
            delay: std::time::Duration::ZERO,
            aggregate: true,
            transitions: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_aggregate(mut self) -> Self {
        self.aggregate = false;
        self
    }

    pub fn with_events(self, events: Vec<OccupancyEvent>) -> Self {
        *self.events.lock().unwrap() = events;
        self
    }

    pub fn transition_calls(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<OccupancyEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MockStore {
    fn user_id(&self) -> &str {
        &self.user
    }

    async fn transition(
        &self,
        action: Action,
        location: Location,
    ) -> AppResult<TransitionOutcome> {
        self.transitions.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut events = self.events.lock().unwrap();
        let state = derive_presence(&self.user, &events);
        let new_state = next_status(state.status(), action)
            .ok_or_else(|| AppError::rejected("not_allowed", "transition not allowed"))?;

        let id = events.len() as i64 + 1;
        let event = OccupancyEvent::scan(self.user.clone(), location, action, Utc::now()).with_id(id);
        events.push(event.clone());

        Ok(TransitionOutcome {
            new_state,
            duration_seconds: None,
            duration_minutes: None,
            event,
        })
    }

    async fn correction_commit(&self, duration_minutes: i64) -> AppResult<OccupancyEvent> {
        let mut events = self.events.lock().unwrap();
        let state = derive_presence(&self.user, &events);
        let location = match state.location {
            Some(loc) if state.is_present => loc,
            _ => return Err(AppError::rejected("no_open_session", "No open session")),
        };

        let id = events.len() as i64 + 1;
        let event =
            OccupancyEvent::correction(self.user.clone(), location, Utc::now(), duration_minutes)
                .with_id(id);
        events.push(event.clone());
        Ok(event)
    }

    async fn query_events(&self, query: &EventQuery) -> AppResult<Vec<OccupancyEvent>> {
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| query.user_id.as_deref().is_none_or(|u| e.user_id == u))
            .filter(|e| query.location.is_none_or(|l| e.location == l))
            .filter(|e| query.since.is_none_or(|s| e.occurred_at >= s))
            .cloned()
            .collect())
    }

    async fn aggregate_current_occupancy(&self, location: Location) -> AppResult<u32> {
        if self.aggregate {
            Ok(fold_occupancy(&self.events.lock().unwrap(), location))
        } else {
            Err(AppError::Unavailable("aggregate endpoint down".into()))
        }
    }
}
