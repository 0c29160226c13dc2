/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced while configuring or running a generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A worker or datacenter ID does not fit its bit field.
    ///
    /// Raised once, when the process identity is built. Never recovered.
    #[error("invalid {field} {value} (must be in 0-{max})")]
    InvalidIdentity {
        field: IdentityField,
        value: i64,
        max: u64,
    },

    /// The clock reads earlier than the last timestamp issued for a scope.
    ///
    /// No state was changed. The caller may retry once `millis` have passed.
    #[error("clock moved backwards; refusing to generate id for {millis} milliseconds")]
    ClockRegression { millis: u64 },

    /// The clock reads earlier than [`crate::EPOCH`], so no timestamp can be
    /// encoded. No state was changed.
    #[error("clock is {millis} milliseconds before the id epoch; refusing to generate id")]
    ClockBeforeEpoch { millis: u64 },
}

/// Names the identity field rejected by [`Error::InvalidIdentity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityField {
    WorkerId,
    DatacenterId,
}

impl core::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WorkerId => f.write_str("worker id"),
            Self::DatacenterId => f.write_str("datacenter id"),
        }
    }
}
