use core::time::Duration;

use futures::future::join_all;

use crate::cluster::{Discovery, PeerAddr, PeerClient, PeerInfo, SanityError};
use crate::{Identity, TimeSource};

/// Largest tolerated distance between the local clock and the peers' mean
/// clock, in milliseconds.
pub const MAX_CLOCK_SKEW: u64 = 10_000;

/// Default per-peer budget for connecting and answering.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Summary of a passing sanity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SanityReport {
    /// Number of peers that were checked.
    pub peers: usize,
    /// Mean peer clock, `None` when there were no peers.
    pub mean_timestamp: Option<u64>,
    /// Distance between the mean peer clock and ours.
    pub skew_millis: Option<u64>,
}

/// Validates this instance's identity and clock against its peers.
///
/// Peers are queried concurrently and the results are only aggregated once
/// every query has finished or timed out, so startup latency is bounded by the
/// slowest peer rather than the sum of all of them.
///
/// # Example
///
/// ```
/// use scopeid::cluster::{BoxError, PeerAddr, PeerClient, PeerInfo, SanityChecker};
/// use scopeid::{Identity, SystemClock, TimeSource};
///
/// struct Healthy;
/// impl PeerClient for Healthy {
///     async fn query_peer(&self, _: &PeerAddr) -> Result<PeerInfo, BoxError> {
///         Ok(PeerInfo {
///             timestamp: SystemClock.current_millis(),
///             datacenter_id: 1,
///             worker_id: 5,
///         })
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let checker = SanityChecker::new(Identity::new(2, 1).unwrap(), SystemClock);
/// let peers = [PeerAddr::new("10.0.0.2", 7609)];
/// let report = checker.check(&peers, &Healthy).await.unwrap();
/// assert_eq!(report.peers, 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct SanityChecker<T>
where
    T: TimeSource,
{
    identity: Identity,
    time: T,
    max_skew: u64,
    peer_timeout: Duration,
}

impl<T> SanityChecker<T>
where
    T: TimeSource,
{
    /// Creates a checker with [`MAX_CLOCK_SKEW`] and [`DEFAULT_PEER_TIMEOUT`].
    pub const fn new(identity: Identity, time: T) -> Self {
        Self {
            identity,
            time,
            max_skew: MAX_CLOCK_SKEW,
            peer_timeout: DEFAULT_PEER_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_max_skew(mut self, millis: u64) -> Self {
        self.max_skew = millis;
        self
    }

    #[must_use]
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    /// Lists peers through `discovery`, checks them, and on success registers
    /// this instance when `register` is set.
    ///
    /// `self_addr` is this instance's announced address. A peer listed under
    /// the same address is a stale registration of this very instance and is
    /// skipped.
    ///
    /// # Errors
    ///
    /// - [`SanityError::Discovery`] if the peer list cannot be obtained.
    /// - Any error from [`Self::check`].
    /// - [`SanityError::RegistrationFailure`] if registration was requested
    ///   and failed, or no address was given to register.
    pub async fn run<D, C>(
        &self,
        discovery: &D,
        client: &C,
        self_addr: Option<&PeerAddr>,
        register: bool,
    ) -> Result<SanityReport, SanityError>
    where
        D: Discovery,
        C: PeerClient,
    {
        let mut peers = discovery
            .list_peers()
            .await
            .map_err(|e| SanityError::Discovery {
                reason: e.to_string(),
            })?;
        if let Some(me) = self_addr {
            peers.retain(|peer| peer != me);
        }

        let report = self.check(&peers, client).await?;

        if register {
            let addr = self_addr.ok_or_else(|| SanityError::RegistrationFailure {
                addr: String::from("<none>"),
                reason: String::from("no address to announce"),
            })?;
            discovery
                .register_self(addr)
                .await
                .map_err(|e| SanityError::RegistrationFailure {
                    addr: addr.to_string(),
                    reason: e.to_string(),
                })?;
            #[cfg(feature = "tracing")]
            tracing::info!(%addr, "registered with discovery");
        }

        Ok(report)
    }

    /// Checks this instance against `peers`.
    ///
    /// An empty peer list passes trivially.
    ///
    /// # Errors
    ///
    /// The first failure found, in this order: an unreachable peer, a peer
    /// in another datacenter, a peer with our worker ID, excessive clock skew.
    pub async fn check<C>(&self, peers: &[PeerAddr], client: &C) -> Result<SanityReport, SanityError>
    where
        C: PeerClient,
    {
        if peers.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::info!("no peers, skipping sanity check");
            return Ok(SanityReport {
                peers: 0,
                mean_timestamp: None,
                skew_millis: None,
            });
        }

        let answers = join_all(peers.iter().map(|peer| self.query(peer, client))).await;
        let infos = peers
            .iter()
            .zip(answers)
            .map(|(peer, answer)| answer.map(|info| (peer, info)))
            .collect::<Result<Vec<_>, _>>()?;

        for (peer, info) in &infos {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                %peer,
                timestamp = info.timestamp,
                datacenter_id = info.datacenter_id,
                worker_id = info.worker_id,
                "peer answered"
            );
            self.validate_identity(peer, info)?;
        }

        // i128 keeps the sum exact for any number of u64 timestamps we could
        // realistically receive.
        let sum: i128 = infos.iter().map(|(_, info)| i128::from(info.timestamp)).sum();
        let mean = sum / infos.len() as i128;
        let local = self.time.current_millis();
        let skew = mean.abs_diff(i128::from(local));
        let mean = u64::try_from(mean).unwrap_or(u64::MAX);
        let skew = u64::try_from(skew).unwrap_or(u64::MAX);

        if skew > self.max_skew {
            return Err(SanityError::ClockSkew {
                mean,
                local,
                skew,
                max: self.max_skew,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(peers = infos.len(), mean, skew, "sanity check passed");

        Ok(SanityReport {
            peers: infos.len(),
            mean_timestamp: Some(mean),
            skew_millis: Some(skew),
        })
    }

    async fn query<C>(&self, peer: &PeerAddr, client: &C) -> Result<PeerInfo, SanityError>
    where
        C: PeerClient,
    {
        match tokio::time::timeout(self.peer_timeout, client.query_peer(peer)).await {
            Ok(Ok(info)) => Ok(info),
            Ok(Err(e)) => Err(SanityError::PeerUnreachable {
                peer: peer.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(SanityError::PeerUnreachable {
                peer: peer.clone(),
                reason: format!("timed out after {}ms", self.peer_timeout.as_millis()),
            }),
        }
    }

    fn validate_identity(&self, peer: &PeerAddr, info: &PeerInfo) -> Result<(), SanityError> {
        if info.datacenter_id != self.identity.datacenter_id() {
            return Err(SanityError::DatacenterMismatch {
                peer: peer.clone(),
                expected: self.identity.datacenter_id(),
                actual: info.datacenter_id,
            });
        }
        if info.worker_id == self.identity.worker_id() {
            return Err(SanityError::DuplicateWorker {
                peer: peer.clone(),
                worker_id: info.worker_id,
            });
        }
        Ok(())
    }
}
