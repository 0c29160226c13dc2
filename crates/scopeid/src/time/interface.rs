use std::sync::Arc;

/// Epoch subtracted from wall-clock time before encoding: Tuesday, December
/// 1, 2015 00:00:00 UTC, in milliseconds since the Unix epoch.
///
/// Every instance of a cluster must agree on this value.
pub const EPOCH: u64 = 1_448_899_200_000;

/// A source of wall-clock time.
///
/// This abstraction lets generators run against the real system clock in
/// production and against a mocked or stepping clock in tests, which is how
/// sequence exhaustion and clock regression are exercised without sleeping.
///
/// # Example
///
/// ```
/// use scopeid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
