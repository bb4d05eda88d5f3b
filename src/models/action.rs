use serde::{Deserialize, Serialize};

/// The two actions a scan (or a correction) can record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Action {
    CheckIn,
    CheckOut,
}

impl Action {
    /// Parse user input: accepts `in`, `checkin`, `check-in` and the `out` counterparts.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" | "checkin" | "check-in" | "check_in" => Some(Self::CheckIn),
            "out" | "checkout" | "check-out" | "check_out" => Some(Self::CheckOut),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CheckIn => "check-in",
            Action::CheckOut => "check-out",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Action::CheckIn => "in",
            Action::CheckOut => "out",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Action::CheckIn),
            "out" => Some(Action::CheckOut),
            _ => None,
        }
    }

    pub fn is_check_in(&self) -> bool {
        matches!(self, Action::CheckIn)
    }

    /// Effect of this action on a location's head count.
    pub fn delta(&self) -> i64 {
        match self {
            Action::CheckIn => 1,
            Action::CheckOut => -1,
        }
    }
}
