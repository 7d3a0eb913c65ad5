//! Node data model.
//!
//! These are our own types, decoupled from the Kubernetes API wire format.
//! A [`Node`] is a read-only snapshot taken once per run; only the `Ready`
//! condition and `InternalIP` addresses are ever consulted.

/// Condition type consulted by the readiness classifier.
pub const CONDITION_READY: &str = "Ready";

/// Condition status that marks a node as ready.
pub const STATUS_TRUE: &str = "True";

/// Address type used as the SSH dial target.
pub const ADDRESS_INTERNAL_IP: &str = "InternalIP";

/// A cluster node snapshot.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name, unique within the inventory.
    pub name: String,
    /// Reported conditions, e.g. `("Ready", "True")`.
    pub conditions: Vec<NodeCondition>,
    /// Reported addresses, tagged by type.
    pub addresses: Vec<NodeAddress>,
}

/// A (type, status) condition pair reported by the node.
#[derive(Debug, Clone)]
pub struct NodeCondition {
    pub condition_type: String,
    pub status: String,
}

/// A (type, value) address pair reported by the node.
#[derive(Debug, Clone)]
pub struct NodeAddress {
    pub address_type: String,
    pub address: String,
}

impl Node {
    /// Create a node with no conditions or addresses.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Iterate over the node's `InternalIP` addresses.
    ///
    /// Commonly yields exactly one address; a node may legitimately
    /// report none at all.
    pub fn internal_ips(&self) -> impl Iterator<Item = &str> {
        self.addresses
            .iter()
            .filter(|a| a.address_type == ADDRESS_INTERNAL_IP)
            .map(|a| a.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_addresses(addresses: Vec<(&str, &str)>) -> Node {
        Node {
            name: "worker-1".to_string(),
            conditions: Vec::new(),
            addresses: addresses
                .into_iter()
                .map(|(t, a)| NodeAddress {
                    address_type: t.to_string(),
                    address: a.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_internal_ips_filters_by_type() {
        let node = node_with_addresses(vec![
            ("ExternalIP", "203.0.113.10"),
            ("InternalIP", "10.0.0.5"),
            ("Hostname", "worker-1"),
        ]);

        let ips: Vec<&str> = node.internal_ips().collect();
        assert_eq!(ips, vec!["10.0.0.5"]);
    }

    #[test]
    fn test_internal_ips_empty_when_none_reported() {
        let node = node_with_addresses(vec![("Hostname", "worker-1")]);
        assert_eq!(node.internal_ips().count(), 0);
    }

    #[test]
    fn test_internal_ips_yields_all_internal_addresses() {
        let node = node_with_addresses(vec![
            ("InternalIP", "10.0.0.5"),
            ("InternalIP", "10.0.1.5"),
        ]);
        assert_eq!(node.internal_ips().count(), 2);
    }
}
