use crate::{Identity, Result, ScopeRegistry, ScopedId, SystemClock, TimeSource};

/// The externally callable surface of an ID allocator instance.
///
/// Wraps the process [`Identity`] and a [`ScopeRegistry`]. Every method is
/// safe to call from many threads at once; the only shared mutation happens
/// inside the registry and the per-scope generators.
///
/// # Example
///
/// ```
/// use scopeid::{Allocator, Identity};
///
/// let allocator = Allocator::new(Identity::new(2, 1).unwrap());
/// let id = allocator.next_id("orders").unwrap();
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(allocator.list_scopes(), ["orders"]);
/// ```
pub struct Allocator<T = SystemClock>
where
    T: TimeSource + Clone,
{
    identity: Identity,
    time: T,
    registry: ScopeRegistry<T>,
}

impl Allocator<SystemClock> {
    /// Creates an allocator backed by the system wall clock.
    pub fn new(identity: Identity) -> Self {
        Self::with_time(identity, SystemClock)
    }
}

impl<T> Allocator<T>
where
    T: TimeSource + Clone,
{
    /// Creates an allocator using `time` for both generators and
    /// [`Self::current_timestamp`].
    pub fn with_time(identity: Identity, time: T) -> Self {
        Self {
            identity,
            registry: ScopeRegistry::new(identity, time.clone()),
            time,
        }
    }

    pub const fn identity(&self) -> Identity {
        self.identity
    }

    pub const fn worker_id(&self) -> u8 {
        self.identity.worker_id()
    }

    pub const fn datacenter_id(&self) -> u8 {
        self.identity.datacenter_id()
    }

    /// Wall-clock milliseconds since the Unix epoch, independent of any
    /// generator. Peers compare this value during their sanity check.
    pub fn current_timestamp(&self) -> u64 {
        self.time.current_millis()
    }

    /// Issues the next ID for `scope`.
    ///
    /// IDs are unique and strictly increasing within a scope. Different scopes
    /// are separate namespaces and may issue equal values.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ClockRegression`] if the clock moved backwards
    /// since the scope's last ID, or [`crate::Error::ClockBeforeEpoch`] if it
    /// reads earlier than [`crate::EPOCH`].
    pub fn next_id(&self, scope: &str) -> Result<ScopedId> {
        self.registry.get_or_create(scope).next_id()
    }

    /// Sorted snapshot of the scopes that have issued at least one request.
    pub fn list_scopes(&self) -> Vec<String> {
        let mut scopes = self.registry.scopes();
        scopes.sort_unstable();
        scopes
    }
}
