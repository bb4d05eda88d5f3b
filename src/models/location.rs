use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Main,   // M
    Annex,  // A
    Lab,    // L
    Studio, // S
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Main,
        Location::Annex,
        Location::Lab,
        Location::Studio,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Location::Main => "M",
            Location::Annex => "A",
            Location::Lab => "L",
            Location::Studio => "S",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Location::Main => "Main hall",
            Location::Annex => "Annex",
            Location::Lab => "Lab",
            Location::Studio => "Studio",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.code()
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Location::Main),
            "A" => Some(Location::Annex),
            "L" => Some(Location::Lab),
            "S" => Some(Location::Studio),
            _ => None,
        }
    }

    /// Helper: convert input code from CLI or scan payloads.
    /// Accepts the one-letter code or the full name, in any case.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if let Some(loc) = Location::from_db_str(&code.to_uppercase()) {
            return Some(loc);
        }

        match code.to_lowercase().as_str() {
            "main" => Some(Location::Main),
            "annex" => Some(Location::Annex),
            "lab" => Some(Location::Lab),
            "studio" => Some(Location::Studio),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
