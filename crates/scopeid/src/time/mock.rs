//! Controllable clocks for tests.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::TimeSource;

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub(crate) struct MockTime {
    millis: AtomicU64,
}

impl MockTime {
    pub(crate) fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    pub(crate) fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Reads `base` for the first `tick_after` reads, then `base + 1`.
///
/// Lets a test observe how many times a generator polled the clock while
/// waiting for the next millisecond.
#[derive(Debug)]
pub(crate) struct TickAfter {
    base: u64,
    tick_after: u64,
    reads: AtomicU64,
}

impl TickAfter {
    pub(crate) fn new(base: u64, tick_after: u64) -> Self {
        Self {
            base,
            tick_after,
            reads: AtomicU64::new(0),
        }
    }

    pub(crate) fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TimeSource for TickAfter {
    fn current_millis(&self) -> u64 {
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.tick_after {
            self.base
        } else {
            self.base + 1
        }
    }
}
