//! Cluster node inventory.
//!
//! The [`NodeInventory`] trait abstracts where the node list comes from,
//! allowing the run orchestrator to be driven by a static list in tests.
//! [`KubeApiInventory`] fetches the list from the Kubernetes API server
//! via `reqwest`, deserializing only the fields the check needs.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::node::{Node, NodeAddress, NodeCondition};

/// Default timeout for API server requests.
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Service-account token path inside a pod.
const TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Cluster CA certificate path inside a pod.
const CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Errors while obtaining the node inventory.
///
/// All of these are fatal to the run: without an inventory there is nothing
/// meaningful to check.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// In-cluster configuration could not be assembled.
    #[error("cluster client setup failed: {0}")]
    ClusterSetup(String),

    /// The HTTP request to the API server failed.
    #[error("node list request failed: {0}")]
    Http(String),

    /// The API server answered with a non-success status.
    #[error("node list request returned status {status}")]
    Status { status: u16 },

    /// The response body did not deserialize into a node list.
    #[error("unexpected node list response: {0}")]
    Json(String),
}

/// Trait for listing all nodes in the cluster.
pub trait NodeInventory: Send + Sync {
    /// Fetch a snapshot of every node, with its conditions and addresses.
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<Node>, InventoryError>> + Send;
}

/// Node inventory backed by the Kubernetes API server.
///
/// Uses the in-cluster service-account environment: API server address from
/// `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`, bearer token and
/// cluster CA from the mounted service-account volume.
pub struct KubeApiInventory {
    /// API server base URL, e.g. `https://10.96.0.1:443`.
    base_url: String,

    /// Bearer token for the service account.
    token: String,

    /// Reusable HTTP client with the cluster CA installed.
    http: reqwest::Client,
}

impl KubeApiInventory {
    /// Build an inventory client from the in-cluster environment.
    pub async fn from_cluster_env() -> Result<Self, InventoryError> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            InventoryError::ClusterSetup(
                "KUBERNETES_SERVICE_HOST not set (not running in a cluster?)".to_string(),
            )
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        let token = tokio::fs::read_to_string(TOKEN_PATH)
            .await
            .map_err(|e| {
                InventoryError::ClusterSetup(format!("reading service-account token: {e}"))
            })?
            .trim()
            .to_string();

        let ca_pem = tokio::fs::read(CA_PATH)
            .await
            .map_err(|e| InventoryError::ClusterSetup(format!("reading cluster CA: {e}")))?;
        let ca = reqwest::Certificate::from_pem(&ca_pem)
            .map_err(|e| InventoryError::ClusterSetup(format!("parsing cluster CA: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_API_TIMEOUT)
            .add_root_certificate(ca)
            .build()
            .map_err(|e| InventoryError::ClusterSetup(format!("building http client: {e}")))?;

        Ok(Self {
            base_url: cluster_base_url(&host, &port),
            token,
            http,
        })
    }

    /// Build an inventory client against an explicit API server.
    ///
    /// Useful outside a pod, against a proxy (`kubectl proxy`) or a test
    /// server. The default client trusts only system roots.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_API_TIMEOUT)
            .build()
            .map_err(|e| InventoryError::ClusterSetup(format!("building http client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
        })
    }
}

impl NodeInventory for KubeApiInventory {
    async fn list_nodes(&self) -> Result<Vec<Node>, InventoryError> {
        let url = format!("{}/api/v1/nodes", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| InventoryError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InventoryError::Http(e.to_string()))?;

        let nodes = parse_node_list(&bytes)?;
        debug!(nodes = nodes.len(), "node inventory fetched");
        Ok(nodes)
    }
}

/// API server base URL from the in-cluster host and port values.
fn cluster_base_url(host: &str, port: &str) -> String {
    format!("https://{host}:{port}")
}

/// Parse a `v1.NodeList` response body into our node snapshots.
///
/// Unknown fields are ignored; absent status sections become empty
/// condition and address sets.
fn parse_node_list(body: &[u8]) -> Result<Vec<Node>, InventoryError> {
    let list: WireNodeList =
        serde_json::from_slice(body).map_err(|e| InventoryError::Json(e.to_string()))?;

    Ok(list
        .items
        .into_iter()
        .map(|item| Node {
            name: item.metadata.name,
            conditions: item
                .status
                .conditions
                .into_iter()
                .map(|c| NodeCondition {
                    condition_type: c.condition_type,
                    status: c.status,
                })
                .collect(),
            addresses: item
                .status
                .addresses
                .into_iter()
                .map(|a| NodeAddress {
                    address_type: a.address_type,
                    address: a.address,
                })
                .collect(),
        })
        .collect())
}

/// Wire format of the `v1.NodeList` response; only the consulted fields.
#[derive(Deserialize)]
struct WireNodeList {
    #[serde(default)]
    items: Vec<WireNode>,
}

#[derive(Deserialize)]
struct WireNode {
    metadata: WireMetadata,
    #[serde(default)]
    status: WireNodeStatus,
}

#[derive(Deserialize)]
struct WireMetadata {
    name: String,
}

#[derive(Deserialize, Default)]
struct WireNodeStatus {
    #[serde(default)]
    conditions: Vec<WireCondition>,
    #[serde(default)]
    addresses: Vec<WireAddress>,
}

#[derive(Deserialize)]
struct WireCondition {
    #[serde(rename = "type")]
    condition_type: String,
    status: String,
}

#[derive(Deserialize)]
struct WireAddress {
    #[serde(rename = "type")]
    address_type: String,
    address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_base_url() {
        assert_eq!(cluster_base_url("10.96.0.1", "443"), "https://10.96.0.1:443");
    }

    #[test]
    fn test_parse_node_list_extracts_consulted_fields() {
        // Trimmed from a real API server response; extra fields must be
        // tolerated.
        let body = r#"{
            "kind": "NodeList",
            "apiVersion": "v1",
            "metadata": {"resourceVersion": "12345"},
            "items": [
                {
                    "metadata": {
                        "name": "worker-1",
                        "uid": "8f7c0d4e",
                        "labels": {"kubernetes.io/os": "linux"}
                    },
                    "status": {
                        "conditions": [
                            {"type": "MemoryPressure", "status": "False", "reason": "KubeletHasSufficientMemory"},
                            {"type": "Ready", "status": "True", "reason": "KubeletReady"}
                        ],
                        "addresses": [
                            {"type": "InternalIP", "address": "10.0.0.5"},
                            {"type": "Hostname", "address": "worker-1"}
                        ],
                        "nodeInfo": {"kubeletVersion": "v1.29.0"}
                    }
                }
            ]
        }"#;

        let nodes = parse_node_list(body.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 1);

        let node = &nodes[0];
        assert_eq!(node.name, "worker-1");
        assert_eq!(node.conditions.len(), 2);
        assert_eq!(node.conditions[1].condition_type, "Ready");
        assert_eq!(node.conditions[1].status, "True");
        assert_eq!(node.internal_ips().collect::<Vec<_>>(), vec!["10.0.0.5"]);
    }

    #[test]
    fn test_parse_node_list_empty_items() {
        let nodes = parse_node_list(br#"{"kind": "NodeList", "items": []}"#).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_parse_node_list_missing_status_section() {
        let body = r#"{"items": [{"metadata": {"name": "bare-node"}}]}"#;
        let nodes = parse_node_list(body.as_bytes()).unwrap();
        assert_eq!(nodes[0].name, "bare-node");
        assert!(nodes[0].conditions.is_empty());
        assert!(nodes[0].addresses.is_empty());
    }

    #[test]
    fn test_parse_node_list_rejects_garbage() {
        let err = parse_node_list(b"not json").unwrap_err();
        assert!(matches!(err, InventoryError::Json(_)));
    }
}
