use scopeid_tonic_core::scopeid::cluster::{BoxError, Discovery, PeerAddr};

/// Peers given up front. Registration has nowhere to go and is a no-op.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    peers: Vec<PeerAddr>,
}

impl StaticDiscovery {
    pub const fn new(peers: Vec<PeerAddr>) -> Self {
        Self { peers }
    }
}

impl Discovery for StaticDiscovery {
    async fn list_peers(&self) -> Result<Vec<PeerAddr>, BoxError> {
        Ok(self.peers.clone())
    }

    async fn register_self(&self, _addr: &PeerAddr) -> Result<(), BoxError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_configured_peers() {
        let peers = vec![PeerAddr::new("10.0.0.2", 7609), PeerAddr::new("10.0.0.3", 7609)];
        let discovery = StaticDiscovery::new(peers.clone());
        assert_eq!(discovery.list_peers().await.unwrap(), peers);
        discovery
            .register_self(&PeerAddr::new("10.0.0.1", 7609))
            .await
            .unwrap();
    }
}
