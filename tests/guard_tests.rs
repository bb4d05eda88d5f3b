use rpresence::core::guard::{GuardState, ScanGuard};

#[test]
fn test_guard_single_flight() {
    let guard = ScanGuard::new();
    assert_eq!(guard.state(), GuardState::Idle);

    assert!(guard.try_acquire());
    assert_eq!(guard.state(), GuardState::Locked);
    assert!(!guard.try_acquire(), "second acquire must fail while locked");

    guard.release();
    assert_eq!(guard.state(), GuardState::Idle);
    assert!(guard.try_acquire());
}

#[test]
fn test_permit_releases_on_drop() {
    let guard = ScanGuard::new();
    {
        let permit = guard.try_lock();
        assert!(permit.is_some());
        assert!(guard.try_lock().is_none());
    }
    assert_eq!(guard.state(), GuardState::Idle);
    assert!(guard.try_lock().is_some());
}

#[test]
fn test_permit_released_on_early_return() {
    fn work(guard: &ScanGuard, fail: bool) -> Result<(), String> {
        let _permit = guard.try_lock().ok_or("busy")?;
        if fail {
            return Err("store refused".into());
        }
        Ok(())
    }

    let guard = ScanGuard::new();
    assert!(work(&guard, true).is_err());
    assert_eq!(guard.state(), GuardState::Idle);
    assert!(work(&guard, false).is_ok());
}

#[test]
fn test_closed_guard_refuses_and_unlocks() {
    let guard = ScanGuard::new();
    assert!(guard.try_acquire());

    guard.close();
    assert!(guard.is_closed());
    assert_eq!(guard.state(), GuardState::Idle);
    assert!(!guard.try_acquire());
    assert!(guard.try_lock().is_none());
}

#[test]
fn test_guards_are_independent() {
    let a = ScanGuard::new();
    let b = ScanGuard::new();

    let _held = a.try_lock();
    assert_eq!(a.state(), GuardState::Locked);
    assert_eq!(b.state(), GuardState::Idle);
    assert!(b.try_lock().is_some());
}
