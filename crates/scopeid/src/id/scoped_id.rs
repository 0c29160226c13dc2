use core::fmt;

use crate::time::EPOCH;

/// A 64-bit scoped Snowflake ID.
///
/// - 6 bits reserved (always zero, so the value fits a positive `i64`)
/// - 41 bits timestamp (ms since [`EPOCH`])
/// - 3 bits datacenter ID
/// - 4 bits worker ID
/// - 10 bits sequence
///
/// ```text
///  Bit Index:  63          58 57           17 16         14 13        10 9             0
///              +--------------+---------------+-------------+------------+---------------+
///  Field:      | reserved (6) | timestamp (41)| datacenter  | worker (4) | sequence (10) |
///              |              |               |     (3)     |            |               |
///              +--------------+---------------+-------------+------------+---------------+
///              |<------------- MSB ------------- 64 bits ------------- LSB ------------->|
/// ```
///
/// The field widths bound a cluster to 8 datacenters of 16 workers each, and a
/// single scope on a single instance to 1024 IDs per millisecond. Changing
/// them breaks every ID already issued, so they are constants rather than
/// configuration.
///
/// # Example
///
/// ```
/// use scopeid::ScopedId;
///
/// let id = ScopedId::from_components(1000, 1, 2, 3);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.datacenter_id(), 1);
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(id.sequence(), 3);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ScopedId {
    id: u64,
}

impl ScopedId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 41;
    /// Width of the datacenter ID field.
    pub const DATACENTER_ID_BITS: u32 = 3;
    /// Width of the worker ID field.
    pub const WORKER_ID_BITS: u32 = 4;
    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 10;

    /// Bitmask for the 41-bit timestamp field (before shifting).
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
    /// Bitmask for the 3-bit datacenter ID field (before shifting).
    pub const DATACENTER_ID_MASK: u64 = (1 << Self::DATACENTER_ID_BITS) - 1;
    /// Bitmask for the 4-bit worker ID field (before shifting).
    pub const WORKER_ID_MASK: u64 = (1 << Self::WORKER_ID_BITS) - 1;
    /// Bitmask for the 10-bit sequence field.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the worker ID to its position (bit 10).
    pub const WORKER_ID_SHIFT: u32 = Self::SEQUENCE_BITS;
    /// Number of bits to shift the datacenter ID to its position (bit 14).
    pub const DATACENTER_ID_SHIFT: u32 = Self::WORKER_ID_SHIFT + Self::WORKER_ID_BITS;
    /// Number of bits to shift the timestamp to its position (bit 17).
    pub const TIMESTAMP_SHIFT: u32 = Self::DATACENTER_ID_SHIFT + Self::DATACENTER_ID_BITS;

    /// Packs the four fields into an ID.
    ///
    /// Each component is truncated to its field width. Worker and datacenter
    /// IDs are validated once by [`crate::Identity::new`], so in practice only
    /// a timestamp beyond [`Self::max_timestamp`] (year 2085) is ever
    /// truncated.
    pub const fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let d = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let w = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let s = sequence & Self::SEQUENCE_MASK;
        Self { id: t | d | w | s }
    }

    /// Extracts the timestamp (ms since [`EPOCH`]).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Largest value the timestamp field can hold.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Largest valid datacenter ID (7).
    pub const fn max_datacenter_id() -> u64 {
        Self::DATACENTER_ID_MASK
    }

    /// Largest valid worker ID (15).
    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    /// Largest sequence value within one millisecond (1023).
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns `true` if the reserved high bits are clear.
    ///
    /// Every ID produced by [`Self::from_components`] is valid; only values
    /// built with [`Self::from_raw`] can fail this check.
    pub const fn is_valid(&self) -> bool {
        self.id >> (Self::TIMESTAMP_SHIFT + Self::TIMESTAMP_BITS) == 0
    }

    /// Wall-clock milliseconds since the Unix epoch at which this ID was
    /// issued.
    pub const fn unix_millis(&self) -> u64 {
        self.timestamp() + EPOCH
    }

    /// Converts this type into its raw representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw value into this type. No validation is performed.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 20-digit string.
    ///
    /// Padded strings sort in the same order as the numeric IDs.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<ScopedId> for u64 {
    fn from(id: ScopedId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for ScopedId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for ScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for ScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedId")
            .field("id", &self.id)
            .field("padded", &self.to_padded_string())
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
