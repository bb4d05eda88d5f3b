use super::{action::Action, location::Location};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where an event came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventSource {
    /// A decoded scan accepted by the store.
    Scan,
    /// A synthetic check-out committed by the stale-session workflow.
    Correction,
}

impl EventSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventSource::Scan => "scan",
            EventSource::Correction => "correction",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "scan" => Some(EventSource::Scan),
            "correction" => Some(EventSource::Correction),
            _ => None,
        }
    }
}

/// One immutable check-in / check-out record of the occupancy log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupancyEvent {
    pub id: i64,                       // ⇔ events.id (server-assigned)
    pub user_id: String,               // ⇔ events.user_id
    pub location: Location,            // ⇔ events.location ('M','A','L','S')
    pub action: Action,                // ⇔ events.action ('in' | 'out')
    pub occurred_at: DateTime<Utc>,    // ⇔ events.occurred_at (server timestamp)
    pub source: EventSource,           // ⇔ events.source ('scan' | 'correction')
    pub duration_minutes: Option<i64>, // ⇔ events.duration_minutes (corrections only)
}

impl OccupancyEvent {
    /// Build a scan event. `id` is 0 until the store assigns one.
    pub fn scan(
        user_id: impl Into<String>,
        location: Location,
        action: Action,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.into(),
            location,
            action,
            occurred_at,
            source: EventSource::Scan,
            duration_minutes: None,
        }
    }

    /// Build the synthetic check-out written by a manual correction.
    pub fn correction(
        user_id: impl Into<String>,
        location: Location,
        occurred_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.into(),
            location,
            action: Action::CheckOut,
            occurred_at,
            source: EventSource::Correction,
            duration_minutes: Some(duration_minutes),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn is_correction(&self) -> bool {
        self.source == EventSource::Correction
    }

    /// Chronological order; ties on the timestamp fall back to the id.
    pub fn chrono_cmp(&self, other: &Self) -> Ordering {
        self.occurred_at
            .cmp(&other.occurred_at)
            .then(self.id.cmp(&other.id))
    }

    /// Fixed-width UTC representation: lexical order equals chronological order.
    pub fn occurred_at_str(&self) -> String {
        format_timestamp(&self.occurred_at)
    }

    pub fn local_time_str(&self) -> String {
        self.occurred_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
