//! SSH connectivity probing.
//!
//! The [`Prober`] trait abstracts the per-node reachability check so the
//! run orchestrator can be exercised with spy implementations in tests.
//! [`SshProber`] is the real implementation: it dials every `InternalIP`
//! address on the node and performs a public-key authenticated SSH
//! handshake, closing the connection before returning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::{KeyPair, PublicKey};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::node::Node;

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default per-address dial timeout.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single node probe.
///
/// All variants are recoverable at the run level: the orchestrator records
/// the message and continues with the remaining nodes.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The configured private key material could not be decoded.
    #[error("invalid ssh private key: {0}")]
    KeyParse(String),

    /// TCP connect failed.
    #[error("node {node}: connect to {addr} failed: {message}")]
    Connect {
        node: String,
        addr: String,
        message: String,
    },

    /// TCP connect did not complete within the dial timeout.
    #[error("node {node}: connect to {addr} timed out after {timeout:?}")]
    Timeout {
        node: String,
        addr: String,
        timeout: Duration,
    },

    /// SSH transport handshake or key exchange failed. Host keys rejected
    /// by the configured policy surface here.
    #[error("node {node}: ssh handshake with {addr} failed: {message}")]
    Handshake {
        node: String,
        addr: String,
        message: String,
    },

    /// The server rejected the public-key credential.
    #[error("node {node}: ssh authentication rejected for user '{user}' at {addr}")]
    AuthRejected {
        node: String,
        addr: String,
        user: String,
    },
}

/// Host identity verification policy.
///
/// The health-check context deliberately defaults to [`AcceptAny`]: the goal
/// is connectivity and credential validation, not man-in-the-middle defense.
/// The strict mode is reachable through configuration alone.
///
/// [`AcceptAny`]: HostKeyPolicy::AcceptAny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Accept any server host key without verification.
    #[default]
    AcceptAny,
    /// Verify the server host key against the local known-hosts file.
    KnownHosts,
}

impl HostKeyPolicy {
    /// Parse a policy name as it appears in configuration.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "accept-any" => Some(HostKeyPolicy::AcceptAny),
            "known-hosts" => Some(HostKeyPolicy::KnownHosts),
            _ => None,
        }
    }

    /// Configuration name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKeyPolicy::AcceptAny => "accept-any",
            HostKeyPolicy::KnownHosts => "known-hosts",
        }
    }
}

/// Trait for probing a single node's SSH reachability.
pub trait Prober: Send + Sync {
    /// Attempt an authenticated connection to every `InternalIP` address
    /// on the node. Returns the first error encountered; `Ok` when every
    /// dial succeeds or the node reports no `InternalIP` at all.
    fn probe(&self, node: &Node) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// SSH prober using public-key authentication via `russh`.
pub struct SshProber {
    /// Private key material (PEM or OpenSSH format), decoded per probe.
    key_material: String,
    /// Login username.
    username: String,
    /// Dial port.
    port: u16,
    /// Per-address dial timeout.
    timeout: Duration,
    /// Host identity verification policy.
    host_key_policy: HostKeyPolicy,
}

impl SshProber {
    /// Create a prober with the default port, timeout, and host-key policy.
    pub fn new(key_material: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            key_material: key_material.into(),
            username: username.into(),
            port: DEFAULT_SSH_PORT,
            timeout: DEFAULT_DIAL_TIMEOUT,
            host_key_policy: HostKeyPolicy::AcceptAny,
        }
    }

    /// Set the dial port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-address dial timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the host identity verification policy.
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Dial one address and run the authenticated handshake.
    ///
    /// The connection is closed before this returns, success or failure.
    async fn dial(&self, node_name: &str, ip: &str, key: Arc<KeyPair>) -> Result<(), ProbeError> {
        let addr = format!("{}:{}", ip, self.port);

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProbeError::Timeout {
                node: node_name.to_string(),
                addr: addr.clone(),
                timeout: self.timeout,
            })?
            .map_err(|e| ProbeError::Connect {
                node: node_name.to_string(),
                addr: addr.clone(),
                message: e.to_string(),
            })?;

        let config = Arc::new(client::Config {
            inactivity_timeout: Some(self.timeout),
            ..Default::default()
        });
        let handler = ProbeHandler {
            policy: self.host_key_policy,
            host: ip.to_string(),
            port: self.port,
        };

        let mut session = client::connect_stream(config, stream, handler)
            .await
            .map_err(|e| ProbeError::Handshake {
                node: node_name.to_string(),
                addr: addr.clone(),
                message: e.to_string(),
            })?;

        let authenticated = session
            .authenticate_publickey(&self.username, key)
            .await
            .map_err(|e| ProbeError::Handshake {
                node: node_name.to_string(),
                addr: addr.clone(),
                message: e.to_string(),
            })?;

        // Close the connection now rather than leaking it until process exit.
        let _ = session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await;

        if !authenticated {
            return Err(ProbeError::AuthRejected {
                node: node_name.to_string(),
                addr,
                user: self.username.clone(),
            });
        }

        debug!(node = node_name, addr = %addr, "ssh dial succeeded");
        Ok(())
    }
}

impl Prober for SshProber {
    async fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        let ips: Vec<&str> = node.internal_ips().collect();
        if ips.is_empty() {
            // Baseline semantics: unreachable-but-not-erroring.
            warn!(node = %node.name, "node reports no InternalIP address, nothing to dial");
            return Ok(());
        }

        let key = russh_keys::decode_secret_key(&self.key_material, None)
            .map_err(|e| ProbeError::KeyParse(e.to_string()))?;
        let key = Arc::new(key);

        info!(node = %node.name, addresses = ips.len(), "attempting ssh connection");
        for ip in ips {
            self.dial(&node.name, ip, key.clone()).await?;
        }
        Ok(())
    }
}

/// russh client handler applying the configured host-key policy.
struct ProbeHandler {
    policy: HostKeyPolicy,
    host: String,
    port: u16,
}

#[async_trait]
impl client::Handler for ProbeHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::AcceptAny => Ok(true),
            HostKeyPolicy::KnownHosts => {
                match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
                    Ok(known) => Ok(known),
                    Err(e) => {
                        warn!(
                            host = %self.host,
                            error = %e,
                            "known-hosts lookup failed, rejecting host key"
                        );
                        Ok(false)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeAddress, ADDRESS_INTERNAL_IP};

    fn node_with_internal_ip(ip: &str) -> Node {
        let mut node = Node::new("worker-1");
        node.addresses.push(NodeAddress {
            address_type: ADDRESS_INTERNAL_IP.to_string(),
            address: ip.to_string(),
        });
        node
    }

    #[test]
    fn test_host_key_policy_parse() {
        assert_eq!(
            HostKeyPolicy::parse("accept-any"),
            Some(HostKeyPolicy::AcceptAny)
        );
        assert_eq!(
            HostKeyPolicy::parse("known-hosts"),
            Some(HostKeyPolicy::KnownHosts)
        );
        assert_eq!(HostKeyPolicy::parse("strict"), None);
        assert_eq!(HostKeyPolicy::parse(""), None);
    }

    #[test]
    fn test_host_key_policy_round_trip() {
        for policy in [HostKeyPolicy::AcceptAny, HostKeyPolicy::KnownHosts] {
            assert_eq!(HostKeyPolicy::parse(policy.as_str()), Some(policy));
        }
    }

    #[test]
    fn test_host_key_policy_default_is_accept_any() {
        assert_eq!(HostKeyPolicy::default(), HostKeyPolicy::AcceptAny);
    }

    #[test]
    fn test_prober_builder() {
        let prober = SshProber::new("key material", "admin")
            .with_port(2222)
            .with_timeout(Duration::from_secs(3))
            .with_host_key_policy(HostKeyPolicy::KnownHosts);

        assert_eq!(prober.port, 2222);
        assert_eq!(prober.timeout, Duration::from_secs(3));
        assert_eq!(prober.host_key_policy, HostKeyPolicy::KnownHosts);
        assert_eq!(prober.username, "admin");
    }

    #[tokio::test]
    async fn test_probe_no_internal_ip_is_ok() {
        // No InternalIP means the dial loop never executes, so even a
        // garbage key must not produce an error.
        let prober = SshProber::new("not a real key", "admin");
        let node = Node::new("addressless");

        assert!(prober.probe(&node).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_malformed_key_is_parse_error() {
        let prober = SshProber::new("not a real key", "admin");
        let node = node_with_internal_ip("127.0.0.1");

        let err = prober.probe(&node).await.unwrap_err();
        assert!(matches!(err, ProbeError::KeyParse(_)), "got: {err}");
    }

    #[test]
    fn test_probe_error_messages_name_the_node() {
        let err = ProbeError::Connect {
            node: "worker-1".to_string(),
            addr: "10.0.0.5:22".to_string(),
            message: "connection refused".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("worker-1"));
        assert!(rendered.contains("10.0.0.5:22"));
        assert!(rendered.contains("connection refused"));
    }
}
