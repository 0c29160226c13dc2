use core::future::Future;

use crate::cluster::{PeerAddr, PeerInfo};

/// Boxed error returned by network collaborators.
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Queries a single peer allocator.
///
/// Implementations issue the peer's `timestamp`, `datacenter_id` and
/// `worker_id` calls over whatever transport the deployment uses. Timeouts are
/// applied by the caller.
pub trait PeerClient {
    fn query_peer(
        &self,
        peer: &PeerAddr,
    ) -> impl Future<Output = Result<PeerInfo, BoxError>> + Send;
}

/// Finds peer allocators and announces this one.
pub trait Discovery {
    /// Returns every allocator currently registered for the service.
    fn list_peers(&self) -> impl Future<Output = Result<Vec<PeerAddr>, BoxError>> + Send;

    /// Registers this instance so that instances started later can check
    /// against it.
    fn register_self(&self, addr: &PeerAddr) -> impl Future<Output = Result<(), BoxError>> + Send;
}
