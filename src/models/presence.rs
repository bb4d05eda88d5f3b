use super::location::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two states of the presence machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PresenceStatus {
    Away,
    CheckedIn,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Away => "AWAY",
            PresenceStatus::CheckedIn => "CHECKED_IN",
        }
    }
}

/// Derived view of a single user's presence. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PresenceState {
    pub user_id: String,
    /// Location of the last event, if any.
    pub location: Option<Location>,
    pub is_present: bool,
    /// Timestamp of the last event, if any.
    pub since: Option<DateTime<Utc>>,
}

impl PresenceState {
    /// A user with no events at all.
    pub fn away(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            location: None,
            is_present: false,
            since: None,
        }
    }

    pub fn status(&self) -> PresenceStatus {
        if self.is_present {
            PresenceStatus::CheckedIn
        } else {
            PresenceStatus::Away
        }
    }

    /// Check-in timestamp of the open session, if the user is present.
    pub fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        if self.is_present { self.since } else { None }
    }
}
