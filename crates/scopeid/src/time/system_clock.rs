use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// The operating system's wall clock.
///
/// Unlike a monotonic timer this clock can move backwards when an operator or
/// NTP steps it. Generators detect that and report
/// [`Error::ClockRegression`](crate::Error::ClockRegression) instead of
/// issuing IDs that could collide with ones already handed out.
///
/// Peers compare wall-clock readings during the startup sanity check, which
/// is why this is the production clock rather than an `Instant`-based one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A clock set before 1970 reads as zero, which any previously issued
        // timestamp will then report as a regression.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPOCH;

    #[test]
    fn reads_after_epoch() {
        let now = SystemClock.current_millis();
        assert!(now > EPOCH);
    }

    #[test]
    fn does_not_go_backwards_across_a_sleep() {
        let a = SystemClock.current_millis();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = SystemClock.current_millis();
        assert!(b >= a);
    }
}
