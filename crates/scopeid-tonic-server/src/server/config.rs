use anyhow::{anyhow, bail};
use clap::Parser;
use core::time::Duration;
use scopeid_tonic_core::{
    DEFAULT_SERVICE_NAME,
    scopeid::{
        Identity,
        cluster::{DEFAULT_PEER_TIMEOUT, MAX_CLOCK_SKEW, PeerAddr},
    },
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Runtime configuration for the `scopeid-server` binary.
///
/// Every setting can be given as a CLI flag or an environment variable, and a
/// `.env` file in the working directory is read before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "scopeid-server",
    version,
    about = "A cluster-aware gRPC service issuing scoped 64-bit IDs",
    allow_negative_numbers = true
)]
pub struct CliArgs {
    /// TCP port to serve on. Must be greater than 0.
    ///
    /// Environment variable: `PORT`
    #[arg(short, long, env = "PORT")]
    pub port: u16,

    /// Interface to bind.
    ///
    /// Environment variable: `BIND_ADDR`
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Worker ID (0-15). Must be unique within the datacenter.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(short, long, env = "WORKER_ID", default_value_t = 0)]
    pub worker_id: i64,

    /// Datacenter ID (0-7). Must match every peer.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0)]
    pub datacenter_id: i64,

    /// Fixed list of peers to check at startup, as `host:port,host:port`.
    ///
    /// Environment variable: `PEERS`
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Consul agents used to discover peers, as `host:port,host:port`. They
    /// are tried in order until one answers.
    ///
    /// Environment variable: `CONSUL_SERVERS`
    #[arg(long, env = "CONSUL_SERVERS", value_delimiter = ',')]
    pub consul: Vec<String>,

    /// Service name looked up in (and registered with) Consul.
    ///
    /// Environment variable: `SERVICE_NAME`
    #[arg(long, env = "SERVICE_NAME", default_value_t = String::from(DEFAULT_SERVICE_NAME))]
    pub service_name: String,

    /// Address peers use to reach this instance, as `host:port`. Defaults to
    /// the bind address when that is not a wildcard.
    ///
    /// Environment variable: `ADVERTISE_ADDR`
    #[arg(long, env = "ADVERTISE_ADDR")]
    pub advertise_addr: Option<String>,

    /// Register with Consul once the startup check passes.
    ///
    /// Environment variable: `REGISTER`
    #[arg(long, env = "REGISTER", default_value_t = false)]
    pub register: bool,

    /// Per-peer budget for the startup check, in milliseconds.
    ///
    /// Environment variable: `PEER_TIMEOUT_MS`
    #[arg(long, env = "PEER_TIMEOUT_MS", default_value_t = DEFAULT_PEER_TIMEOUT.as_millis() as u64)]
    pub peer_timeout_ms: u64,

    /// Largest tolerated distance from the peers' mean clock, in milliseconds.
    ///
    /// Environment variable: `MAX_SKEW_MS`
    #[arg(long, env = "MAX_SKEW_MS", default_value_t = MAX_CLOCK_SKEW)]
    pub max_skew_ms: u64,
}

/// Where the startup check finds its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryConfig {
    /// No peers configured; the check is skipped.
    Disabled,
    Static(Vec<PeerAddr>),
    Consul {
        servers: Vec<String>,
        service_name: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub identity: Identity,
    pub discovery: DiscoveryConfig,
    pub advertise_addr: Option<PeerAddr>,
    pub register: bool,
    pub peer_timeout: Duration,
    pub max_skew: u64,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.port == 0 {
            bail!("PORT must be greater than 0");
        }

        let identity = Identity::new(args.worker_id, args.datacenter_id)?;

        let peers = non_empty(args.peers);
        let consul = non_empty(args.consul);

        if !peers.is_empty() && !consul.is_empty() {
            bail!("PEERS and CONSUL_SERVERS are mutually exclusive");
        }
        if args.register && consul.is_empty() {
            bail!("REGISTER requires CONSUL_SERVERS");
        }
        if args.peer_timeout_ms == 0 {
            bail!("PEER_TIMEOUT_MS must be greater than 0");
        }

        let discovery = if !consul.is_empty() {
            DiscoveryConfig::Consul {
                servers: consul,
                service_name: args.service_name,
            }
        } else if !peers.is_empty() {
            let peers = peers
                .iter()
                .map(|raw| {
                    raw.parse::<PeerAddr>()
                        .map_err(|e| anyhow!("invalid peer address `{raw}`: {e}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            DiscoveryConfig::Static(peers)
        } else {
            DiscoveryConfig::Disabled
        };

        let advertise_addr = match args.advertise_addr {
            Some(raw) => Some(
                raw.parse::<PeerAddr>()
                    .map_err(|e| anyhow!("invalid ADVERTISE_ADDR `{raw}`: {e}"))?,
            ),
            None if !args.bind.is_unspecified() => {
                Some(PeerAddr::new(args.bind.to_string(), args.port))
            }
            None => None,
        };

        if args.register && advertise_addr.is_none() {
            bail!("REGISTER requires ADVERTISE_ADDR when BIND_ADDR is a wildcard address");
        }

        Ok(Self {
            listen_addr: SocketAddr::new(args.bind, args.port),
            identity,
            discovery,
            advertise_addr,
            register: args.register,
            peer_timeout: Duration::from_millis(args.peer_timeout_ms),
            max_skew: args.max_skew_ms,
        })
    }
}

/// Drops blank entries left by trailing or doubled commas.
fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
