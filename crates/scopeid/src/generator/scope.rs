use core::cmp::Ordering;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{EPOCH, Error, Identity, Poll, Result, ScopedId, TimeSource};

/// Mutable generator state. Only ever touched while the generator's lock is
/// held.
#[derive(Debug, Default)]
struct State {
    /// Wall-clock millis of the last issued ID; `None` until the first one.
    last_timestamp: Option<u64>,
    sequence: u64,
}

/// The sequence generator for a single scope.
///
/// Each generator owns its `(last_timestamp, sequence)` pair behind its own
/// [`parking_lot::Mutex`]. Reading the clock, comparing, updating the state
/// and encoding all happen in one critical section, so two callers on the same
/// scope can never be handed the same `(timestamp, sequence)` pair. Distinct
/// scopes never contend with each other.
///
/// ## Clock handling
///
/// | clock vs. last issued | result                                            |
/// |-----------------------|---------------------------------------------------|
/// | later                 | sequence resets to 0                              |
/// | same millisecond      | sequence increments; [`Poll::Pending`] once 1023 was used |
/// | earlier               | [`Error::ClockRegression`], state untouched       |
/// | before [`EPOCH`]      | [`Error::ClockBeforeEpoch`], state untouched      |
///
/// [`Self::next_id`] turns `Pending` into a busy-wait on the clock, so callers
/// only ever see an ID or a regression.
pub struct ScopeGenerator<T>
where
    T: TimeSource,
{
    identity: Identity,
    state: Mutex<State>,
    time: T,
}

impl<T> ScopeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator that has never issued an ID.
    pub fn new(identity: Identity, time: T) -> Self {
        Self {
            identity,
            state: Mutex::new(State::default()),
            time,
        }
    }

    /// The identity encoded into every ID from this generator.
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Wall-clock millis of the last issued ID, or `None` if nothing has been
    /// issued yet.
    pub fn last_timestamp(&self) -> Option<u64> {
        self.state.lock().last_timestamp
    }

    /// Sequence number of the last issued ID.
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Generates the next ID, spinning on the clock while the current
    /// millisecond's sequence space is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock reads earlier than the
    /// last issued timestamp. The generator does not retry internally.
    ///
    /// # Example
    ///
    /// ```
    /// use scopeid::{Identity, ScopeGenerator, SystemClock};
    ///
    /// let generator = ScopeGenerator::new(Identity::new(3, 1).unwrap(), SystemClock);
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// assert_eq!(b.worker_id(), 3);
    /// ```
    pub fn next_id(&self) -> Result<ScopedId> {
        self.next_id_with(|_| core::hint::spin_loop())
    }

    /// Like [`Self::next_id`], but calls `f` with the suggested back-off each
    /// time the sequence is exhausted instead of spinning.
    ///
    /// `f` may sleep, yield or spin; the clock is re-read on every attempt
    /// regardless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock moved backwards, or
    /// [`Error::ClockBeforeEpoch`] if it reads earlier than [`EPOCH`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, f)))]
    pub fn next_id_with(&self, mut f: impl FnMut(u64)) -> Result<ScopedId> {
        loop {
            match self.poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Makes one attempt at issuing an ID.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: a new ID was issued
    /// - `Ok(Poll::Pending { yield_for })`: the current millisecond is full
    /// - `Err(Error::ClockRegression { .. })`: the clock went backwards
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock reads earlier than the
    /// last issued timestamp, or [`Error::ClockBeforeEpoch`] if it reads
    /// earlier than [`EPOCH`]. State is left unchanged.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut state = self.state.lock();
        // Read under the lock: a reading taken before another caller issued a
        // later timestamp would otherwise look like a regression.
        let now = self.time.current_millis();
        if now < EPOCH {
            return Err(Self::cold_clock_before_epoch(now));
        }

        let sequence = match state.last_timestamp.map(|last| (now.cmp(&last), last)) {
            None | Some((Ordering::Greater, _)) => 0,
            Some((Ordering::Equal, _)) => {
                if state.sequence < ScopedId::max_sequence() {
                    state.sequence + 1
                } else {
                    return Ok(Poll::Pending { yield_for: 1 });
                }
            }
            Some((Ordering::Less, last)) => return Err(Self::cold_clock_behind(now, last)),
        };

        state.last_timestamp = Some(now);
        state.sequence = sequence;

        Ok(Poll::Ready {
            id: ScopedId::from_components(
                now - EPOCH,
                u64::from(self.identity.datacenter_id()),
                u64::from(self.identity.worker_id()),
                sequence,
            ),
        })
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        let millis = last - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            last_timestamp = last,
            now,
            millis,
            "clock is moving backwards, rejecting requests"
        );
        Error::ClockRegression { millis }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_before_epoch(now: u64) -> Error {
        let millis = EPOCH - now;
        #[cfg(feature = "tracing")]
        tracing::error!(now, epoch = EPOCH, "clock reads before the id epoch, rejecting requests");
        Error::ClockBeforeEpoch { millis }
    }
}

impl<T> core::fmt::Debug for ScopeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScopeGenerator")
            .field("identity", &self.identity)
            .field("last_timestamp", &state.last_timestamp)
            .field("sequence", &state.sequence)
            .finish_non_exhaustive()
    }
}
