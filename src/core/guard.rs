//! Single-flight lock for one scanner session.
//!
//! Optical scanners decode the same code on several consecutive frames. The
//! guard makes sure only one of those decodes reaches the store while a
//! transition is in flight. There is one guard per scanner session, never a
//! process-wide flag.

use std::sync::{Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Locked,
}

#[derive(Debug)]
struct Inner {
    state: GuardState,
    closed: bool,
}

#[derive(Debug)]
pub struct ScanGuard {
    inner: Mutex<Inner>,
}

impl Default for ScanGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanGuard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: GuardState::Idle,
                closed: false,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // the lock only guards two plain fields: a poisoned value is still consistent
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> GuardState {
        self.inner().state
    }

    pub fn is_closed(&self) -> bool {
        self.inner().closed
    }

    /// Returns false while a scan is in flight or after `close()`.
    /// On true the caller owes exactly one `release()`.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner();
        if inner.closed || inner.state == GuardState::Locked {
            trace!(closed = inner.closed, "scan guard busy");
            return false;
        }
        inner.state = GuardState::Locked;
        true
    }

    pub fn release(&self) {
        self.inner().state = GuardState::Idle;
    }

    /// RAII form of `try_acquire`: the permit releases on drop, on every exit path.
    pub fn try_lock(&self) -> Option<ScanPermit<'_>> {
        self.try_acquire().then_some(ScanPermit { guard: self })
    }

    /// Tear down: unlock, and refuse every later acquire.
    pub fn close(&self) {
        let mut inner = self.inner();
        inner.closed = true;
        inner.state = GuardState::Idle;
    }
}

/// Proof of holding the guard. Dropping it releases the lock.
#[derive(Debug)]
pub struct ScanPermit<'a> {
    guard: &'a ScanGuard,
}

impl Drop for ScanPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}
