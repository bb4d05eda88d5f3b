use chrono::{DateTime, Utc};
use serde::Serialize;

/// One bar of the occupancy chart. Produced per render, never cached.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct OccupancySample {
    pub bucket_start: DateTime<Utc>,
    pub level: u32,
}
