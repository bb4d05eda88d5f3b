//! Live head count per location.

use crate::errors::AppResult;
use crate::models::event::OccupancyEvent;
use crate::models::location::Location;
use crate::store::{EventQuery, EventStore};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum CountSource {
    Aggregate,
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct OccupancyReading {
    pub location: Location,
    pub count: u32,
    pub source: CountSource,
}

/// Client-side head count: per user, the most recent event at `location` wins.
///
/// Events are scanned newest first; the first event seen for a user decides
/// them. Raw check-in/check-out totals are never compared.
pub fn fold_occupancy(events: &[OccupancyEvent], location: Location) -> u32 {
    let mut sorted: Vec<&OccupancyEvent> =
        events.iter().filter(|e| e.location == location).collect();
    sorted.sort_by(|a, b| b.chrono_cmp(a));

    let mut resolved: HashSet<&str> = HashSet::new();
    let mut count = 0;
    for ev in sorted {
        if resolved.insert(ev.user_id.as_str()) && ev.action.is_check_in() {
            count += 1;
        }
    }
    count
}

pub struct LiveOccupancyCounter<'a, S: EventStore + ?Sized> {
    store: &'a S,
    force_fallback: bool,
}

impl<'a, S: EventStore + ?Sized> LiveOccupancyCounter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            force_fallback: false,
        }
    }

    /// Skip the aggregate call and always fold the log.
    pub fn force_fallback(mut self, yes: bool) -> Self {
        self.force_fallback = yes;
        self
    }

    /// One aggregate call; folds the full location log only if that fails.
    pub async fn current(&self, location: Location) -> AppResult<OccupancyReading> {
        if !self.force_fallback {
            match self.store.aggregate_current_occupancy(location).await {
                Ok(count) => {
                    return Ok(OccupancyReading {
                        location,
                        count,
                        source: CountSource::Aggregate,
                    });
                }
                Err(e) => {
                    warn!(location = location.code(), error = %e, "aggregate unavailable, folding log");
                }
            }
        }

        let events = self
            .store
            .query_events(&EventQuery::for_location(location))
            .await?;

        Ok(OccupancyReading {
            location,
            count: fold_occupancy(&events, location),
            source: CountSource::Fallback,
        })
    }

    pub async fn all(&self) -> AppResult<Vec<OccupancyReading>> {
        let mut out = Vec::with_capacity(Location::ALL.len());
        for loc in Location::ALL {
            out.push(self.current(loc).await?);
        }
        Ok(out)
    }
}
