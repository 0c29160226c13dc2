use crate::ScopedId;

/// The outcome of a single, non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly issued ID.
/// - [`Poll::Pending`] means all 1024 sequence values of the current
///   millisecond are used up; nothing can be issued until the clock moves
///   past it.
///
/// A backwards clock is not a `Pending` state: it is reported as
/// [`crate::Error::ClockRegression`] because waiting it out is the caller's
/// decision.
///
/// # Example
///
/// ```
/// use scopeid::{Identity, Poll, ScopeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         scopeid::EPOCH + 1
///     }
/// }
///
/// let generator = ScopeGenerator::new(Identity::new(0, 0).unwrap(), FixedTime);
/// match generator.poll_id().unwrap() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for } => println!("Back off for {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: ScopedId,
    },
    /// The sequence is exhausted for the current millisecond.
    Pending {
        /// Milliseconds to wait before the next attempt can succeed.
        yield_for: u64,
    },
}
