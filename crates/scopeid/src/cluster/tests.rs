use core::time::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::Identity;
use crate::cluster::{
    BoxError, Discovery, PeerAddr, PeerClient, PeerInfo, SanityChecker, SanityError,
};
use crate::time::mock::MockTime;

const NOW: u64 = 1_700_000_000_000;

/// Answers from a fixed table; unknown peers fail like a refused connection.
#[derive(Default)]
struct MockPeers {
    answers: HashMap<PeerAddr, PeerInfo>,
    hang: Vec<PeerAddr>,
}

impl MockPeers {
    fn with(mut self, peer: &PeerAddr, timestamp: u64, datacenter_id: u8, worker_id: u8) -> Self {
        self.answers.insert(
            peer.clone(),
            PeerInfo {
                timestamp,
                datacenter_id,
                worker_id,
            },
        );
        self
    }

    fn hanging(mut self, peer: &PeerAddr) -> Self {
        self.hang.push(peer.clone());
        self
    }
}

impl PeerClient for MockPeers {
    async fn query_peer(&self, peer: &PeerAddr) -> Result<PeerInfo, BoxError> {
        if self.hang.contains(peer) {
            core::future::pending::<()>().await;
        }
        self.answers
            .get(peer)
            .copied()
            .ok_or_else(|| "connection refused".into())
    }
}

#[derive(Default)]
struct MockDiscovery {
    peers: Vec<PeerAddr>,
    fail_list: bool,
    fail_register: bool,
    registered: Mutex<Vec<PeerAddr>>,
}

impl Discovery for MockDiscovery {
    async fn list_peers(&self) -> Result<Vec<PeerAddr>, BoxError> {
        if self.fail_list {
            return Err("catalog unavailable".into());
        }
        Ok(self.peers.clone())
    }

    async fn register_self(&self, addr: &PeerAddr) -> Result<(), BoxError> {
        if self.fail_register {
            return Err("agent rejected registration".into());
        }
        self.registered.lock().unwrap().push(addr.clone());
        Ok(())
    }
}

fn peer(n: u8) -> PeerAddr {
    PeerAddr::new(format!("10.0.0.{n}"), 7609)
}

fn checker() -> SanityChecker<Arc<MockTime>> {
    SanityChecker::new(Identity::new(2, 1).unwrap(), Arc::new(MockTime::new(NOW)))
}

#[tokio::test]
async fn empty_peer_list_passes() {
    let report = checker().check(&[], &MockPeers::default()).await.unwrap();
    assert_eq!(report.peers, 0);
    assert_eq!(report.mean_timestamp, None);
}

#[tokio::test]
async fn healthy_peer_passes() {
    let client = MockPeers::default().with(&peer(1), NOW - 800, 1, 5);
    let report = checker().check(&[peer(1)], &client).await.unwrap();
    assert_eq!(report.peers, 1);
    assert_eq!(report.mean_timestamp, Some(NOW - 800));
    assert_eq!(report.skew_millis, Some(800));
}

#[tokio::test]
async fn duplicate_worker_fails_even_if_other_peers_pass() {
    let client = MockPeers::default()
        .with(&peer(1), NOW - 800, 1, 5)
        .with(&peer(2), NOW, 1, 2);
    let err = checker().check(&[peer(1), peer(2)], &client).await.unwrap_err();
    assert_eq!(
        err,
        SanityError::DuplicateWorker {
            peer: peer(2),
            worker_id: 2,
        }
    );
    assert!(err.to_string().contains("10.0.0.2:7609"));
}

#[tokio::test]
async fn datacenter_mismatch_fails() {
    let client = MockPeers::default().with(&peer(1), NOW, 3, 5);
    let err = checker().check(&[peer(1)], &client).await.unwrap_err();
    assert_eq!(
        err,
        SanityError::DatacenterMismatch {
            peer: peer(1),
            expected: 1,
            actual: 3,
        }
    );
}

#[tokio::test]
async fn skew_of_fifteen_seconds_fails() {
    let client = MockPeers::default()
        .with(&peer(1), NOW + 14_000, 1, 5)
        .with(&peer(2), NOW + 16_000, 1, 6);
    let err = checker().check(&[peer(1), peer(2)], &client).await.unwrap_err();
    assert_eq!(
        err,
        SanityError::ClockSkew {
            mean: NOW + 15_000,
            local: NOW,
            skew: 15_000,
            max: 10_000,
        }
    );
}

#[tokio::test]
async fn skew_of_five_seconds_passes() {
    let client = MockPeers::default()
        .with(&peer(1), NOW - 4_000, 1, 5)
        .with(&peer(2), NOW - 6_000, 1, 6);
    let report = checker().check(&[peer(1), peer(2)], &client).await.unwrap();
    assert_eq!(report.skew_millis, Some(5_000));
}

#[tokio::test]
async fn skew_exactly_at_threshold_passes() {
    let client = MockPeers::default().with(&peer(1), NOW - 10_000, 1, 5);
    assert!(checker().check(&[peer(1)], &client).await.is_ok());

    let client = MockPeers::default().with(&peer(1), NOW - 10_001, 1, 5);
    assert!(checker().check(&[peer(1)], &client).await.is_err());
}

#[tokio::test]
async fn custom_skew_threshold_applies() {
    let client = MockPeers::default().with(&peer(1), NOW + 2_000, 1, 5);
    let err = checker()
        .with_max_skew(1_000)
        .check(&[peer(1)], &client)
        .await
        .unwrap_err();
    assert!(matches!(err, SanityError::ClockSkew { skew: 2_000, .. }));
}

#[tokio::test]
async fn unreachable_peer_fails() {
    let client = MockPeers::default().with(&peer(1), NOW, 1, 5);
    let err = checker().check(&[peer(1), peer(9)], &client).await.unwrap_err();
    assert_eq!(
        err,
        SanityError::PeerUnreachable {
            peer: peer(9),
            reason: String::from("connection refused"),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_peer_times_out() {
    let client = MockPeers::default()
        .with(&peer(1), NOW, 1, 5)
        .hanging(&peer(2));
    let err = checker()
        .with_peer_timeout(Duration::from_millis(250))
        .check(&[peer(1), peer(2)], &client)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SanityError::PeerUnreachable {
            peer: peer(2),
            reason: String::from("timed out after 250ms"),
        }
    );
}

#[tokio::test]
async fn run_registers_after_passing() {
    let me = peer(100);
    let discovery = MockDiscovery {
        peers: vec![peer(1), me.clone()],
        ..Default::default()
    };
    let client = MockPeers::default().with(&peer(1), NOW, 1, 5);

    let report = checker()
        .run(&discovery, &client, Some(&me), true)
        .await
        .unwrap();
    // Our own stale registration is not treated as a peer.
    assert_eq!(report.peers, 1);
    assert_eq!(*discovery.registered.lock().unwrap(), [me]);
}

#[tokio::test]
async fn run_does_not_register_when_check_fails() {
    let me = peer(100);
    let discovery = MockDiscovery {
        peers: vec![peer(1)],
        ..Default::default()
    };
    let client = MockPeers::default().with(&peer(1), NOW, 1, 2);

    let err = checker()
        .run(&discovery, &client, Some(&me), true)
        .await
        .unwrap_err();
    assert!(matches!(err, SanityError::DuplicateWorker { .. }));
    assert!(discovery.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_surfaces_discovery_failure() {
    let discovery = MockDiscovery {
        fail_list: true,
        ..Default::default()
    };
    let err = checker()
        .run(&discovery, &MockPeers::default(), None, false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SanityError::Discovery {
            reason: String::from("catalog unavailable"),
        }
    );
}

#[tokio::test]
async fn run_surfaces_registration_failure() {
    let me = peer(100);
    let discovery = MockDiscovery {
        fail_register: true,
        ..Default::default()
    };
    let err = checker()
        .run(&discovery, &MockPeers::default(), Some(&me), true)
        .await
        .unwrap_err();
    assert!(matches!(err, SanityError::RegistrationFailure { .. }));
}

#[tokio::test]
async fn run_without_registration_leaves_discovery_alone() {
    let discovery = MockDiscovery::default();
    checker()
        .run(&discovery, &MockPeers::default(), Some(&peer(100)), false)
        .await
        .unwrap();
    assert!(discovery.registered.lock().unwrap().is_empty());
}
