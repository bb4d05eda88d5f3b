//! Today's occupancy curve, rebuilt from the log and the live count.
//! No snapshot is ever stored.

use crate::core::calculator::buckets::bucketize;
use crate::core::calculator::timeline::{Timeline, build_timeline};
use crate::core::occupancy::LiveOccupancyCounter;
use crate::errors::{AppError, AppResult};
use crate::models::event::OccupancyEvent;
use crate::models::location::Location;
use crate::models::sample::OccupancySample;
use crate::store::{EventQuery, EventStore};
use crate::utils::date::start_of_local_day;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub location: Location,
    pub current_occupancy: u32,
    pub buckets: Vec<OccupancySample>,
    #[serde(skip)]
    pub timeline: Timeline,
}

pub struct TimelineReconstructor {
    bucket_width: Duration,
}

impl TimelineReconstructor {
    pub fn new(bucket_width: Duration) -> Self {
        Self { bucket_width }
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    /// Pure reconstruction. `anchor` is the head count at `now`; without it
    /// nothing is built and the caller is expected to retry later.
    pub fn build(
        &self,
        location: Location,
        events: &[OccupancyEvent],
        anchor: Option<u32>,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<TimelineView> {
        let Some(anchor) = anchor else {
            return Err(AppError::NotReady("current occupancy not loaded".into()));
        };

        let timeline = build_timeline(events, location, anchor, window_start, now);
        let buckets = bucketize(&timeline, self.bucket_width)?;
        debug!(
            location = location.code(),
            events = timeline.events.len(),
            buckets = buckets.len(),
            "timeline rebuilt"
        );

        Ok(TimelineView {
            location,
            current_occupancy: anchor,
            buckets,
            timeline,
        })
    }

    /// Pull the live count and today's events, then rebuild.
    pub async fn today<S>(&self, store: &S, location: Location) -> AppResult<TimelineView>
    where
        S: EventStore + ?Sized,
    {
        let reading = LiveOccupancyCounter::new(store).current(location).await?;
        let window_start = start_of_local_day(Utc::now());
        let events = store
            .query_events(&EventQuery::for_location(location).since(window_start))
            .await?;

        // `now` is taken after both fetches so nothing fetched lies in the future
        self.build(location, &events, Some(reading.count), window_start, Utc::now())
    }
}
