use crate::models::event::OccupancyEvent;
use crate::models::location::Location;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Level in effect from `at` onwards, until the next step.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Step {
    pub at: DateTime<Utc>,
    pub level: i64,
}

/// Right-continuous step function of a location's head count over
/// `[window_start, now]`, reconstructed backward from `anchor`.
///
/// Levels are signed: a log that disagrees with the anchor can push the
/// reconstructed past below zero. Display code clamps.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub location: Location,
    pub window_start: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub anchor: u32,
    /// Level before the first event of the window. Not authoritative.
    pub floor: i64,
    /// Ascending by time.
    pub steps: Vec<Step>,
    #[serde(skip)]
    pub events: Vec<OccupancyEvent>,
}

impl Timeline {
    /// Last known level at or before `t`.
    pub fn level_at(&self, t: DateTime<Utc>) -> i64 {
        let idx = self.steps.partition_point(|s| s.at <= t);
        if idx == 0 {
            self.floor
        } else {
            self.steps[idx - 1].level
        }
    }

    /// Replay the window forward from the floor. Equals `anchor` by construction.
    pub fn replay_forward(&self) -> i64 {
        self.events
            .iter()
            .fold(self.floor, |level, ev| level + ev.action.delta())
    }

    pub fn first_event_at(&self) -> Option<DateTime<Utc>> {
        self.steps.first().map(|s| s.at)
    }
}

pub fn build_timeline(
    events: &[OccupancyEvent],
    location: Location,
    anchor: u32,
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Timeline {
    // -----------------------------
    // Keep the window, newest first
    // -----------------------------
    let mut window: Vec<OccupancyEvent> = events
        .iter()
        .filter(|e| e.location == location && e.occurred_at >= window_start)
        .filter(|e| {
            if e.occurred_at > now {
                debug!(event_id = e.id, "skipping event stamped after now");
                return false;
            }
            true
        })
        .cloned()
        .collect();
    window.sort_by(|a, b| b.chrono_cmp(a));

    // -----------------------------
    // Walk backward from the anchor
    // -----------------------------
    let mut running = i64::from(anchor);
    let mut steps = Vec::with_capacity(window.len());

    for ev in &window {
        // `running` is the level right after `ev`; undo it to get the one before
        steps.push(Step {
            at: ev.occurred_at,
            level: running,
        });
        running -= ev.action.delta();
    }

    steps.reverse();
    window.reverse();

    Timeline {
        location,
        window_start,
        now,
        anchor,
        floor: running,
        steps,
        events: window,
    }
}
