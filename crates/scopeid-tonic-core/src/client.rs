//! gRPC implementation of the sanity checker's [`PeerClient`].

use core::time::Duration;

use scopeid::cluster::{BoxError, PeerAddr, PeerClient, PeerInfo};
use tonic::transport::Endpoint;

use crate::proto::{
    GetDatacenterIdRequest, GetTimestampRequest, GetWorkerIdRequest,
    id_allocator_client::IdAllocatorClient,
};

/// Queries peers over plaintext HTTP/2 gRPC.
///
/// A fresh connection is opened per peer; the check runs once at startup, so
/// there is nothing to pool.
#[derive(Debug, Clone, Copy)]
pub struct TonicPeerClient {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for TonicPeerClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(3))
    }
}

impl TonicPeerClient {
    pub const fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    fn endpoint(&self, peer: &PeerAddr) -> Result<Endpoint, tonic::transport::Error> {
        // `PeerAddr`'s `Display` is a URI authority, IPv6 brackets included.
        Ok(Endpoint::from_shared(format!("http://{peer}"))?
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout))
    }
}

impl PeerClient for TonicPeerClient {
    async fn query_peer(&self, peer: &PeerAddr) -> Result<PeerInfo, BoxError> {
        let channel = self.endpoint(peer)?.connect().await?;
        let mut client = IdAllocatorClient::new(channel);

        let timestamp = client
            .get_timestamp(GetTimestampRequest {})
            .await?
            .into_inner()
            .timestamp;
        let datacenter_id = client
            .get_datacenter_id(GetDatacenterIdRequest {})
            .await?
            .into_inner()
            .datacenter_id;
        let worker_id = client
            .get_worker_id(GetWorkerIdRequest {})
            .await?
            .into_inner()
            .worker_id;

        Ok(PeerInfo {
            timestamp,
            datacenter_id: u8::try_from(datacenter_id)?,
            worker_id: u8::try_from(worker_id)?,
        })
    }
}
