use core::{fmt, str::FromStr};

/// Network address of a peer allocator, as reported by discovery.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Formats as a URI authority: IPv6 hosts are bracketed (`[fd00::2]:7609`).
impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Error returned when a `host:port` string cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid peer address `{input}`: {reason}")]
pub struct ParsePeerAddrError {
    input: String,
    reason: &'static str,
}

impl FromStr for PeerAddr {
    type Err = ParsePeerAddrError;

    /// Parses `host:port`. IPv6 hosts must be bracketed (`[::1]:7609`); the
    /// brackets are not kept in [`PeerAddr::host`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParsePeerAddrError {
            input: s.to_owned(),
            reason,
        };
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(|| err("missing port"))?;
        let host = match host.strip_prefix('[') {
            Some(inner) => inner
                .strip_suffix(']')
                .ok_or_else(|| err("unterminated IPv6 bracket"))?,
            None if host.contains(':') => return Err(err("IPv6 hosts must be bracketed")),
            None => host,
        };
        if host.is_empty() {
            return Err(err("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| err("port is not a number"))?;
        if port == 0 {
            return Err(err("port must be greater than 0"));
        }
        Ok(Self::new(host, port))
    }
}

/// What a peer reports about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    /// The peer's wall clock, in milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub datacenter_id: u8,
    pub worker_id: u8,
}
