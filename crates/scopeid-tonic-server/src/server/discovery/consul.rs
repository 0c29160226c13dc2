//! Peer discovery through the Consul HTTP API.
//!
//! Peers are read from the service catalog
//! (`GET /v1/catalog/service/<name>`). Each configured agent is tried in order
//! and the first one that answers wins. Registration goes through the agent
//! endpoint (`PUT /v1/agent/service/register`) of the first agent that accepts
//! it, and is undone on the same agent at shutdown.

use core::time::Duration;
use std::sync::OnceLock;

use scopeid_tonic_core::scopeid::cluster::{BoxError, Discovery, PeerAddr};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConsulError {
    #[error("no Consul agents configured")]
    NoAgents,

    #[error("no Consul agent answered: {0}")]
    AllAgentsFailed(String),

    #[error("already registered as `{0}`")]
    AlreadyRegistered(String),
}

/// One row of `GET /v1/catalog/service/<name>`. Only the fields needed to
/// reach the instance are read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogEntry {
    #[serde(default)]
    address: String,
    #[serde(default)]
    service_address: String,
    #[serde(default)]
    service_port: u16,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Port")]
    port: u16,
}

#[derive(Debug)]
struct Registered {
    agent: String,
    service_id: String,
}

#[derive(Debug)]
pub struct ConsulDiscovery {
    http: reqwest::Client,
    agents: Vec<String>,
    service_name: String,
    registered: OnceLock<Registered>,
}

impl ConsulDiscovery {
    /// Creates a client for `agents` (each `host:port` or a full base URL).
    /// `timeout` bounds every individual HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        agents: Vec<String>,
        service_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            agents,
            service_name: service_name.into(),
            registered: OnceLock::new(),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    async fn fetch_catalog(&self, agent: &str) -> Result<Vec<PeerAddr>, BoxError> {
        let url = format!(
            "{}/v1/catalog/service/{}",
            base_url(agent),
            self.service_name
        );
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(parse_catalog(&body)?)
    }

    async fn register_with(&self, agent: &str, registration: &Registration<'_>) -> Result<(), BoxError> {
        self.http
            .put(format!("{}/v1/agent/service/register", base_url(agent)))
            .json(registration)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Removes the registration made by [`Discovery::register_self`], if any.
    ///
    /// # Errors
    ///
    /// Returns the HTTP error if the agent could not be reached or refused.
    pub async fn deregister(&self) -> Result<(), BoxError> {
        let Some(registered) = self.registered.get() else {
            return Ok(());
        };
        self.http
            .put(format!(
                "{}/v1/agent/service/deregister/{}",
                base_url(&registered.agent),
                registered.service_id
            ))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(service_id = %registered.service_id, "deregistered from Consul");
        Ok(())
    }
}

impl Discovery for ConsulDiscovery {
    async fn list_peers(&self) -> Result<Vec<PeerAddr>, BoxError> {
        if self.agents.is_empty() {
            return Err(ConsulError::NoAgents.into());
        }
        let mut failures = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            match self.fetch_catalog(agent).await {
                Ok(peers) => {
                    tracing::debug!(%agent, peers = peers.len(), "resolved peers from Consul");
                    return Ok(peers);
                }
                Err(e) => {
                    tracing::warn!(%agent, error = %e, "Consul agent did not answer");
                    failures.push(format!("{agent}: {e}"));
                }
            }
        }
        Err(ConsulError::AllAgentsFailed(failures.join("; ")).into())
    }

    async fn register_self(&self, addr: &PeerAddr) -> Result<(), BoxError> {
        if self.agents.is_empty() {
            return Err(ConsulError::NoAgents.into());
        }
        // Only one registration is tracked for deregistration at shutdown.
        if let Some(registered) = self.registered.get() {
            return Err(ConsulError::AlreadyRegistered(registered.service_id.clone()).into());
        }
        let service_id = service_id(&self.service_name, addr);
        let registration = Registration {
            id: &service_id,
            name: &self.service_name,
            address: &addr.host,
            port: addr.port,
        };
        let mut failures = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            match self.register_with(agent, &registration).await {
                Ok(()) => {
                    tracing::info!(%agent, %service_id, "registered with Consul");
                    return self
                        .registered
                        .set(Registered {
                            agent: agent.clone(),
                            service_id: service_id.clone(),
                        })
                        .map_err(|rejected| ConsulError::AlreadyRegistered(rejected.service_id).into());
                }
                Err(e) => {
                    tracing::warn!(%agent, error = %e, "Consul agent refused registration");
                    failures.push(format!("{agent}: {e}"));
                }
            }
        }
        Err(ConsulError::AllAgentsFailed(failures.join("; ")).into())
    }
}

fn base_url(agent: &str) -> String {
    let agent = agent.trim_end_matches('/');
    if agent.starts_with("http://") || agent.starts_with("https://") {
        agent.to_string()
    } else {
        format!("http://{agent}")
    }
}

fn service_id(service_name: &str, addr: &PeerAddr) -> String {
    format!("{service_name}-{}-{}", addr.host, addr.port)
}

/// Parses a catalog response into peer addresses.
///
/// The service address wins over the node address; entries that carry no
/// usable host or port are dropped.
fn parse_catalog(body: &[u8]) -> Result<Vec<PeerAddr>, serde_json::Error> {
    let entries: Vec<CatalogEntry> = serde_json::from_slice(body)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let host = if entry.service_address.is_empty() {
                entry.address
            } else {
                entry.service_address
            };
            if host.is_empty() || entry.service_port == 0 {
                tracing::debug!(%host, port = entry.service_port, "skipping unusable catalog entry");
                return None;
            }
            Some(PeerAddr::new(host, entry.service_port))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CATALOG: &str = r#"[
        {"Node": "a", "Address": "10.0.1.2", "ServiceAddress": "10.0.0.2", "ServicePort": 7609},
        {"Node": "b", "Address": "10.0.1.3", "ServiceAddress": "", "ServicePort": 7610},
        {"Node": "c", "Address": "", "ServiceAddress": "", "ServicePort": 7611},
        {"Node": "d", "Address": "10.0.1.5", "ServiceAddress": "fd00::2", "ServicePort": 7612}
    ]"#;

    #[test]
    fn catalog_prefers_service_address() {
        let peers = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(
            peers,
            vec![
                PeerAddr::new("10.0.0.2", 7609),
                PeerAddr::new("10.0.1.3", 7610),
                PeerAddr::new("fd00::2", 7612),
            ]
        );
    }

    #[test]
    fn ipv6_catalog_entries_are_dialable() {
        let peers = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(peers[2].host, "fd00::2");
        assert_eq!(peers[2].to_string(), "[fd00::2]:7612");
        assert!(
            format!("http://{}", peers[2])
                .parse::<tonic::transport::Uri>()
                .is_ok()
        );
    }

    #[test]
    fn empty_catalog_has_no_peers() {
        assert!(parse_catalog(b"[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        assert!(parse_catalog(b"{\"not\": \"a list\"}").is_err());
    }

    #[test]
    fn registration_body_uses_consul_field_names() {
        let body = serde_json::to_value(Registration {
            id: "idgenerator-10.0.0.1-7609",
            name: "idgenerator",
            address: "10.0.0.1",
            port: 7609,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "ID": "idgenerator-10.0.0.1-7609",
                "Name": "idgenerator",
                "Address": "10.0.0.1",
                "Port": 7609,
            })
        );
    }

    #[test]
    fn agents_may_carry_a_scheme() {
        assert_eq!(base_url("10.0.0.9:8500"), "http://10.0.0.9:8500");
        assert_eq!(base_url("https://consul.local/"), "https://consul.local");
    }

    /// Serves one canned HTTP response and hands back the request line.
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read the head, then as much body as Content-Length announces.
            let expected = loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                    let length = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    break end + 4 + length;
                }
                if n == 0 {
                    break request.len();
                }
            };
            while request.len() < expected {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let request = String::from_utf8_lossy(&request).into_owned();
            request.lines().next().unwrap_or_default().to_string()
        });
        (addr, handle)
    }

    async fn dead_agent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    }

    #[tokio::test]
    async fn falls_through_to_the_next_agent() {
        let dead = dead_agent().await;
        let (live, request) = serve_once(CATALOG).await;
        let discovery =
            ConsulDiscovery::new(vec![dead, live], "idgenerator", Duration::from_secs(2)).unwrap();

        let peers = discovery.list_peers().await.unwrap();
        assert_eq!(peers.len(), 3);
        assert_eq!(
            request.await.unwrap(),
            "GET /v1/catalog/service/idgenerator HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn every_agent_failing_is_an_error() {
        let discovery = ConsulDiscovery::new(
            vec![dead_agent().await, dead_agent().await],
            "idgenerator",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = discovery.list_peers().await.unwrap_err();
        assert!(err.to_string().starts_with("no Consul agent answered"));
    }

    #[tokio::test]
    async fn registers_then_deregisters_on_the_same_agent() {
        let (agent, request) = serve_once("").await;
        let discovery =
            ConsulDiscovery::new(vec![agent.clone()], "idgenerator", Duration::from_secs(2)).unwrap();
        discovery
            .register_self(&PeerAddr::new("10.0.0.1", 7609))
            .await
            .unwrap();
        assert_eq!(
            request.await.unwrap(),
            "PUT /v1/agent/service/register HTTP/1.1"
        );

        // A second registration would be forgotten at shutdown.
        let err = discovery
            .register_self(&PeerAddr::new("10.0.0.1", 7610))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "already registered as `idgenerator-10.0.0.1-7609`"
        );

        // The canned server is gone, so deregistration reports the failure
        // instead of silently succeeding.
        assert!(discovery.deregister().await.is_err());
    }

    #[tokio::test]
    async fn deregister_without_registration_is_a_no_op() {
        let discovery =
            ConsulDiscovery::new(vec![dead_agent().await], "idgenerator", Duration::from_secs(2)).unwrap();
        discovery.deregister().await.unwrap();
    }
}
