//! Node selection: exclusion filtering and readiness classification.
//!
//! Both checks are pure functions over the node snapshot. A node must pass
//! both before it is handed to the connectivity prober.

use std::collections::HashSet;

use crate::node::{Node, CONDITION_READY, STATUS_TRUE};

/// Set of node names excluded from checking.
///
/// Parsed once at startup from a space-delimited string and immutable for
/// the lifetime of the run.
#[derive(Debug, Clone, Default)]
pub struct ExcludeList {
    names: HashSet<String>,
}

impl ExcludeList {
    /// Parse a space-delimited exclusion string.
    ///
    /// Splitting on whitespace means an empty or all-whitespace input
    /// yields an empty set, so a node literally named the empty string
    /// can never match a splitting artifact.
    pub fn parse(raw: &str) -> Self {
        Self {
            names: raw.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Whether the named node is excluded.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of excluded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the exclusion set is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Whether the node's condition set marks it as eligible for checking.
///
/// True iff a condition of type `Ready` reports status `True`. A node
/// without a `Ready` condition is skipped, not treated as an error.
pub fn is_ready(node: &Node) -> bool {
    node.conditions
        .iter()
        .any(|c| c.condition_type == CONDITION_READY && c.status == STATUS_TRUE)
}
