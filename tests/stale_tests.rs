use chrono::{Duration, Utc};
use rpresence::core::presence::derive_presence;
use rpresence::core::stale::{ArmOutcome, StaleSessionDetector, WorkflowState};
use rpresence::errors::AppError;
use rpresence::models::action::Action::CheckIn;
use rpresence::models::location::Location;
use rpresence::models::presence::PresenceState;
use std::time::Duration as StdDuration;
use tokio::time::timeout;

mod common;
use common::{MockStore, ev, t0};

const THRESHOLD_MIN: i64 = 120;

fn detector() -> (
    StaleSessionDetector,
    tokio::sync::mpsc::UnboundedReceiver<rpresence::core::stale::SessionKey>,
) {
    StaleSessionDetector::new(Duration::minutes(THRESHOLD_MIN), 1..=600)
}

fn checked_in(at: chrono::DateTime<Utc>) -> PresenceState {
    derive_presence("alice", &[ev(1, "alice", Location::Main, CheckIn, at)])
}

#[tokio::test(start_paused = true)]
async fn test_one_second_before_threshold_schedules() {
    let (mut det, _rx) = detector();
    let now = t0() + Duration::minutes(THRESHOLD_MIN) - Duration::seconds(1);

    let outcome = det.arm(&checked_in(t0()), now);
    assert_eq!(
        outcome,
        ArmOutcome::Scheduled {
            due_at: t0() + Duration::minutes(THRESHOLD_MIN)
        }
    );
    assert_eq!(det.state(), WorkflowState::Watching);
    assert!(det.has_pending_check());
    assert!(!det.prompt().visible);
}

#[tokio::test(start_paused = true)]
async fn test_one_second_after_threshold_prompts() {
    let (mut det, _rx) = detector();
    let now = t0() + Duration::minutes(THRESHOLD_MIN) + Duration::seconds(1);

    assert_eq!(det.arm(&checked_in(t0()), now), ArmOutcome::Prompting);
    assert_eq!(det.state(), WorkflowState::Prompting);
    assert!(!det.has_pending_check());

    let prompt = det.prompt();
    assert!(prompt.visible);
    assert_eq!(prompt.suggested_start, Some(t0()));
}

#[tokio::test(start_paused = true)]
async fn test_threshold_beyond_date_range_never_comes_due() {
    let (mut det, mut rx) =
        StaleSessionDetector::new(Duration::minutes(1_000_000_000_000), 1..=600);
    let now = t0() + Duration::days(3);

    assert_eq!(
        det.arm(&checked_in(t0()), now),
        ArmOutcome::Scheduled {
            due_at: chrono::DateTime::<Utc>::MAX_UTC
        }
    );
    assert_eq!(det.state(), WorkflowState::Watching);
    assert!(
        timeout(StdDuration::from_secs(3600), rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn test_deferred_check_fires_at_threshold() {
    let (mut det, mut rx) = detector();
    let now = t0() + Duration::minutes(THRESHOLD_MIN - 1);
    det.arm(&checked_in(t0()), now);

    assert!(
        timeout(StdDuration::from_secs(59), rx.recv()).await.is_err(),
        "must not fire before the threshold"
    );

    let key = timeout(StdDuration::from_secs(2), rx.recv())
        .await
        .expect("check fires at the threshold")
        .expect("channel open");
    assert_eq!(key.checked_in_at, t0());

    assert!(det.on_due(&key));
    assert_eq!(det.state(), WorkflowState::Prompting);
    assert!(det.prompt().visible);

    // re-arming while the prompt is open is suppressed
    assert_eq!(
        det.arm(&checked_in(t0()), now + Duration::minutes(5)),
        ArmOutcome::Suppressed
    );
}

#[tokio::test(start_paused = true)]
async fn test_check_cancelled_on_checkout() {
    let (mut det, mut rx) = detector();
    det.arm(&checked_in(t0()), t0() + Duration::minutes(10));
    assert!(det.has_pending_check());

    assert_eq!(
        det.arm(&PresenceState::away("alice"), t0() + Duration::minutes(20)),
        ArmOutcome::Idle
    );
    assert!(!det.has_pending_check());

    assert!(
        timeout(StdDuration::from_secs(3 * 3600), rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn test_new_session_replaces_check() {
    let (mut det, mut rx) = detector();
    det.arm(&checked_in(t0()), t0() + Duration::minutes(10));

    let later = t0() + Duration::minutes(30);
    det.arm(&checked_in(later), later);
    assert_eq!(det.session().map(|k| k.checked_in_at), Some(later));

    let key = timeout(StdDuration::from_secs(3 * 3600), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.checked_in_at, later, "old session's check must not fire");
}

#[tokio::test(start_paused = true)]
async fn test_outdated_key_ignored() {
    let (mut det, mut rx) = detector();
    det.arm(&checked_in(t0()), t0() + Duration::minutes(119));
    let key = rx.recv().await.unwrap();

    det.arm(&PresenceState::away("alice"), t0() + Duration::minutes(121));
    assert!(!det.on_due(&key));
    assert_eq!(det.state(), WorkflowState::Watching);
}

#[tokio::test(start_paused = true)]
async fn test_threshold_change_rearms() {
    let (mut det, _rx) = detector();
    let now = t0() + Duration::minutes(90);
    assert!(matches!(
        det.arm(&checked_in(t0()), now),
        ArmOutcome::Scheduled { .. }
    ));

    let outcome = det.set_threshold(Duration::minutes(60), &checked_in(t0()), now);
    assert_eq!(outcome, ArmOutcome::Prompting);
    assert_eq!(det.threshold(), Duration::minutes(60));
}

#[test]
fn test_duration_validation() {
    let (det, _rx) = StaleSessionDetector::new(Duration::minutes(THRESHOLD_MIN), 1..=600);

    assert_eq!(det.validate_minutes("45").unwrap(), 45);
    assert_eq!(det.validate_minutes(" 600 ").unwrap(), 600);
    for bad in ["", "abc", "4.5", "0", "-10", "601"] {
        assert!(
            matches!(det.validate_minutes(bad), Err(AppError::Validation(_))),
            "'{}' must be rejected",
            bad
        );
    }
}

#[tokio::test]
async fn test_correction_closes_session_once() {
    let checked_in_at = Utc::now() - Duration::hours(3);
    let store = MockStore::new("alice")
        .with_events(vec![ev(1, "alice", Location::Lab, CheckIn, checked_in_at)]);
    let (mut det, _rx) = detector();

    let presence = derive_presence("alice", &store.events());
    assert_eq!(det.arm(&presence, Utc::now()), ArmOutcome::Prompting);

    let event = det.submit(&store, 45).await.unwrap();
    assert!(event.is_correction());
    assert_eq!(event.duration_minutes, Some(45));
    assert_eq!(event.location, Location::Lab);
    assert_eq!(det.state(), WorkflowState::Corrected);
    assert!(!derive_presence("alice", &store.events()).is_present);

    // second attempt on the same session goes nowhere
    assert!(matches!(
        det.submit(&store, 45).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(det.arm(&presence, Utc::now()), ArmOutcome::AlreadyCorrected);
    assert_eq!(store.events().len(), 2);
}

#[tokio::test]
async fn test_failed_commit_keeps_prompt_open() {
    // the store has no open session, the cached presence is out of date
    let store = MockStore::new("alice");
    let (mut det, _rx) = detector();

    det.arm(&checked_in(t0()), t0() + Duration::hours(3));
    let err = det.submit(&store, 30).await.unwrap_err();

    assert!(matches!(err, AppError::TransitionRejected { .. }));
    assert_eq!(det.state(), WorkflowState::Prompting);

    det.dismiss();
    assert_eq!(det.state(), WorkflowState::Watching);
    assert!(!det.prompt().visible);
}

#[tokio::test]
async fn test_out_of_bounds_submit_rejected() {
    let store = MockStore::new("alice")
        .with_events(vec![ev(1, "alice", Location::Main, CheckIn, t0())]);
    let (mut det, _rx) = detector();
    det.arm(&checked_in(t0()), t0() + Duration::hours(3));

    assert!(matches!(
        det.submit(&store, 0).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(det.state(), WorkflowState::Prompting);
    assert_eq!(store.events().len(), 1);
}
