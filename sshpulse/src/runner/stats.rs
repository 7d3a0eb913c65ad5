//! Per-run counters.

/// Counts of how the node inventory was handled during one pass.
///
/// Informational only; the externally observed outcome is the terminal
/// report, not these numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// Nodes in the fetched inventory.
    pub nodes_total: usize,
    /// Nodes skipped by the exclusion filter.
    pub excluded: usize,
    /// Nodes skipped because they were not Ready.
    pub not_ready: usize,
    /// Nodes handed to the prober.
    pub probed: usize,
    /// Probed nodes whose check failed.
    pub failed: usize,
}

impl RunStats {
    /// Stats for an inventory of the given size, nothing processed yet.
    pub fn new(nodes_total: usize) -> Self {
        Self {
            nodes_total,
            ..Self::default()
        }
    }

    /// Probed nodes that passed.
    pub fn succeeded(&self) -> usize {
        self.probed - self.failed
    }
}
