//! One-time startup validation of this instance against its peers.
//!
//! Before an instance serves a single ID it asks every known peer for its
//! clock, datacenter ID and worker ID, and refuses to start if:
//!
//! - a peer cannot be reached or answers with an error,
//! - a peer belongs to a different datacenter,
//! - a peer already uses this instance's worker ID, or
//! - the mean of the peers' clocks is more than [`MAX_CLOCK_SKEW`] away from
//!   the local clock.
//!
//! The check is never repeated while serving; drift that happens afterwards is
//! not detected.
//!
//! Network access is abstracted behind [`PeerClient`] and [`Discovery`], so
//! the checker itself has no transport dependency and can be exercised with
//! in-memory peers.

mod checker;
mod error;
mod interface;
mod peer;
#[cfg(test)]
mod tests;

pub use checker::*;
pub use error::*;
pub use interface::*;
pub use peer::*;
