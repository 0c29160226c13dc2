//! Startup sanity check against the configured peers.

use crate::server::{
    config::{DiscoveryConfig, ServerConfig},
    discovery::{ConsulDiscovery, StaticDiscovery},
};
use scopeid_tonic_core::{
    client::TonicPeerClient,
    scopeid::cluster::{SanityChecker, SanityReport},
    types::Clock,
};

/// Runs the one-time check and, when configured, registers this instance.
///
/// Returns the Consul client this instance registered through, so that the
/// registration can be removed again at shutdown.
///
/// # Errors
///
/// Any failed check is returned and must stop the process before it serves.
pub async fn sanity_check(config: &ServerConfig) -> anyhow::Result<Option<ConsulDiscovery>> {
    let checker = SanityChecker::new(config.identity, Clock::default())
        .with_max_skew(config.max_skew)
        .with_peer_timeout(config.peer_timeout);
    let client = TonicPeerClient::new(config.peer_timeout, config.peer_timeout);
    let self_addr = config.advertise_addr.as_ref();

    match &config.discovery {
        DiscoveryConfig::Disabled => {
            tracing::info!("No peers configured, skipping sanity check");
            Ok(None)
        }
        DiscoveryConfig::Static(peers) => {
            let discovery = StaticDiscovery::new(peers.clone());
            let report = checker.run(&discovery, &client, self_addr, false).await?;
            log_report(&report);
            Ok(None)
        }
        DiscoveryConfig::Consul {
            servers,
            service_name,
        } => {
            let discovery =
                ConsulDiscovery::new(servers.clone(), service_name.clone(), config.peer_timeout)?;
            let report = checker
                .run(&discovery, &client, self_addr, config.register)
                .await?;
            log_report(&report);
            Ok(config.register.then_some(discovery))
        }
    }
}

fn log_report(report: &SanityReport) {
    match (report.mean_timestamp, report.skew_millis) {
        (Some(mean), Some(skew)) => tracing::info!(
            peers = report.peers,
            mean_timestamp = mean,
            skew_ms = skew,
            "Sanity check OK"
        ),
        _ => tracing::info!("Sanity check OK, no peers"),
    }
}
