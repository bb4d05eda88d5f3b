use chrono::Duration;
use proptest::prelude::*;
use rpresence::core::calculator::buckets::bucketize;
use rpresence::core::calculator::timeline::build_timeline;
use rpresence::core::timeline::TimelineReconstructor;
use rpresence::errors::AppError;
use rpresence::models::action::Action::{self, CheckIn, CheckOut};
use rpresence::models::location::Location;
use rpresence::utils::time::minutes;

mod common;
use common::{ev, t0};

#[test]
fn test_backward_replay_single_visit() {
    let events = vec![
        ev(1, "u1", Location::Main, CheckIn, t0()),
        ev(2, "u1", Location::Main, CheckOut, t0() + Duration::seconds(3600)),
    ];
    let now = t0() + Duration::seconds(7200);

    let tl = build_timeline(&events, Location::Main, 0, t0() - Duration::hours(1), now);

    assert_eq!(tl.level_at(t0() + Duration::seconds(1800)), 1);
    assert_eq!(tl.level_at(t0() + Duration::seconds(5400)), 0);
    assert_eq!(tl.floor, 0);
    assert_eq!(tl.replay_forward(), 0);
    assert_eq!(tl.first_event_at(), Some(t0()));
}

#[test]
fn test_buckets_single_visit() {
    let events = vec![
        ev(1, "u1", Location::Main, CheckIn, t0()),
        ev(2, "u1", Location::Main, CheckOut, t0() + Duration::seconds(3600)),
    ];
    let now = t0() + Duration::seconds(7200);

    let view = TimelineReconstructor::new(Duration::minutes(30))
        .build(Location::Main, &events, Some(0), t0(), now)
        .unwrap();

    let levels: Vec<u32> = view.buckets.iter().map(|b| b.level).collect();
    assert_eq!(levels, vec![1, 1, 0, 0, 0]);
    assert_eq!(view.current_occupancy, 0);
    assert_eq!(view.buckets[0].bucket_start, t0());
}

#[test]
fn test_other_locations_and_earlier_days_ignored() {
    let events = vec![
        ev(1, "u1", Location::Main, CheckIn, t0() - Duration::days(1)),
        ev(2, "u2", Location::Lab, CheckIn, t0() + Duration::minutes(10)),
        ev(3, "u3", Location::Main, CheckIn, t0() + Duration::minutes(20)),
    ];
    let now = t0() + Duration::hours(1);

    let tl = build_timeline(&events, Location::Main, 2, t0(), now);
    assert_eq!(tl.events.len(), 1);
    assert_eq!(tl.floor, 1);
    assert_eq!(tl.level_at(t0()), 1);
    assert_eq!(tl.level_at(now), 2);
}

#[test]
fn test_events_after_now_are_skipped() {
    let events = vec![
        ev(1, "u1", Location::Main, CheckIn, t0() + Duration::minutes(10)),
        ev(2, "u2", Location::Main, CheckIn, t0() + Duration::hours(3)),
    ];
    let now = t0() + Duration::hours(1);

    let view = TimelineReconstructor::new(Duration::minutes(15))
        .build(Location::Main, &events, Some(1), t0(), now)
        .unwrap();

    assert_eq!(view.timeline.events.len(), 1);
    assert!(view.buckets.iter().all(|b| b.bucket_start <= now));
    // 08:00, 08:15, 08:30, 08:45, 09:00
    assert_eq!(view.buckets.len(), 5);
}

#[test]
fn test_inconsistent_log_clamps_to_zero() {
    // the anchor says nobody is in, yet the log has one unmatched check-in
    let events = vec![ev(1, "u1", Location::Main, CheckIn, t0() + Duration::minutes(45))];
    let now = t0() + Duration::hours(1);

    let view = TimelineReconstructor::new(Duration::minutes(30))
        .build(Location::Main, &events, Some(0), t0(), now)
        .unwrap();

    assert_eq!(view.timeline.floor, -1);
    assert_eq!(view.timeline.replay_forward(), 0);
    let levels: Vec<u32> = view.buckets.iter().map(|b| b.level).collect();
    assert_eq!(levels, vec![0, 0, 0]);
}

#[test]
fn test_missing_anchor_is_deferred() {
    let err = TimelineReconstructor::new(Duration::minutes(30))
        .build(Location::Main, &[], None, t0(), t0() + Duration::hours(1))
        .unwrap_err();

    assert!(matches!(err, AppError::NotReady(_)));
    assert!(err.is_silent());
}

#[test]
fn test_zero_bucket_width_rejected() {
    let tl = build_timeline(&[], Location::Main, 0, t0(), t0() + Duration::hours(1));
    assert!(matches!(
        bucketize(&tl, Duration::zero()),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn test_short_visit_inside_one_bucket_shows() {
    // in at 08:10, out at 08:20: the bucket starts and ends empty
    let events = vec![
        ev(1, "u1", Location::Main, CheckIn, t0() + Duration::minutes(10)),
        ev(2, "u1", Location::Main, CheckOut, t0() + Duration::minutes(20)),
    ];
    let now = t0() + Duration::hours(1);

    let tl = build_timeline(&events, Location::Main, 0, t0(), now);
    assert_eq!(tl.level_at(t0()), 0);
    assert_eq!(tl.level_at(t0() + Duration::minutes(30)), 0);

    let levels: Vec<u32> = bucketize(&tl, Duration::minutes(30))
        .unwrap()
        .iter()
        .map(|b| b.level)
        .collect();
    assert_eq!(levels, vec![1, 0, 0]);
}

#[test]
fn test_bucket_width_past_date_range_rejected() {
    let tl = build_timeline(&[], Location::Main, 0, t0(), t0() + Duration::hours(1));
    assert!(matches!(
        bucketize(&tl, Duration::minutes(1_000_000_000_000)),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(minutes(i64::MAX), Err(AppError::Validation(_))));
    assert_eq!(minutes(30).unwrap(), Duration::minutes(30));
}

#[test]
fn test_empty_day_is_flat_at_anchor() {
    let now = t0() + Duration::minutes(90);
    let tl = build_timeline(&[], Location::Annex, 3, t0(), now);
    let samples = bucketize(&tl, Duration::minutes(30)).unwrap();

    assert_eq!(samples.len(), 4);
    assert!(samples.iter().all(|s| s.level == 3));
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(CheckIn), Just(CheckOut)]
}

proptest! {
    #[test]
    fn test_replay_reaches_anchor(
        raw in prop::collection::vec((arb_action(), 0i64..36_000), 0..60),
        anchor in 0u32..20,
        width_min in 1i64..120,
    ) {
        let events: Vec<_> = raw
            .iter()
            .enumerate()
            .map(|(i, (a, secs))| {
                ev(i as i64 + 1, &format!("u{}", i % 7), Location::Main, *a, t0() + Duration::seconds(*secs))
            })
            .collect();
        let now = t0() + Duration::hours(10);

        let tl = build_timeline(&events, Location::Main, anchor, t0(), now);
        prop_assert_eq!(tl.replay_forward(), i64::from(anchor));
        prop_assert_eq!(tl.level_at(now), i64::from(anchor));

        let samples = bucketize(&tl, Duration::minutes(width_min)).unwrap();
        let expected = (now - t0()).num_minutes() / width_min + 1;
        prop_assert_eq!(samples.len() as i64, expected);
        prop_assert!(samples.iter().all(|s| s.bucket_start <= now));
        prop_assert!(samples.windows(2).all(|w| w[0].bucket_start < w[1].bucket_start));

        for s in &samples {
            let end = s.bucket_start + Duration::minutes(width_min);
            let peak = tl
                .steps
                .iter()
                .filter(|st| st.at >= s.bucket_start && st.at < end)
                .map(|st| st.level)
                .fold(tl.level_at(s.bucket_start), i64::max);
            prop_assert_eq!(i64::from(s.level), peak.max(0));
        }
    }
}
