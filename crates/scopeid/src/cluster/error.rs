use crate::cluster::PeerAddr;

/// Reasons the startup sanity check refuses to let this instance serve.
///
/// Every variant is fatal: the process must exit rather than serve IDs that
/// could collide with a peer's.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SanityError {
    /// The peer could not be reached, timed out, or returned an error.
    #[error("could not talk to peer {peer}: {reason}")]
    PeerUnreachable { peer: PeerAddr, reason: String },

    /// The peer belongs to a different datacenter.
    #[error("worker at {peer} has datacenter id {actual}, but ours is {expected}")]
    DatacenterMismatch {
        peer: PeerAddr,
        expected: u8,
        actual: u8,
    },

    /// The peer already uses this instance's worker ID.
    #[error("worker at {peer} already uses worker id {worker_id}")]
    DuplicateWorker { peer: PeerAddr, worker_id: u8 },

    /// The local clock is too far from the peers' mean clock.
    #[error(
        "timestamp sanity check failed: mean peer timestamp is {mean}, ours is {local}, \
         {skew}ms apart (max {max}ms)"
    )]
    ClockSkew {
        mean: u64,
        local: u64,
        skew: u64,
        max: u64,
    },

    /// The peer list could not be obtained.
    #[error("unable to resolve peer addresses: {reason}")]
    Discovery { reason: String },

    /// The sanity check passed but this instance could not announce itself.
    #[error("failed to register {addr} with discovery: {reason}")]
    RegistrationFailure { addr: String, reason: String },
}
