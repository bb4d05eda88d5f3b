//! Fixed-width bucketing of a reconstructed timeline for the chart.

use crate::core::calculator::timeline::Timeline;
use crate::errors::{AppError, AppResult};
use crate::models::sample::OccupancySample;
use chrono::Duration;

/// One sample per bucket from `window_start` up to `now`.
///
/// A bucket shows the highest level seen inside it, starting from the level
/// in effect at its start. Buckets starting after `now` are not produced.
pub fn bucketize(timeline: &Timeline, width: Duration) -> AppResult<Vec<OccupancySample>> {
    if width <= Duration::zero() {
        return Err(AppError::Validation(format!(
            "bucket width must be positive, got {} min",
            width.num_minutes()
        )));
    }

    let mut out = Vec::new();
    let mut start = timeline.window_start;

    while start <= timeline.now {
        let Some(end) = start.checked_add_signed(width) else {
            return Err(AppError::Validation(format!(
                "bucket width of {} min runs past the supported date range",
                width.num_minutes()
            )));
        };

        let mut level = timeline.level_at(start);
        let from = timeline.steps.partition_point(|s| s.at < start);
        let to = timeline.steps.partition_point(|s| s.at < end);
        for step in &timeline.steps[from..to] {
            level = level.max(step.level);
        }

        out.push(OccupancySample {
            bucket_start: start,
            level: u32::try_from(level.max(0)).unwrap_or(u32::MAX),
        });
        start = end;
    }

    Ok(out)
}
