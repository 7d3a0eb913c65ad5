//! Run orchestration.
//!
//! [`CheckRun`] drives one full pass over the node inventory: exclusion
//! filter, readiness classifier, connectivity probe. Probe failures are
//! accumulated across the *entire* inventory and exactly one terminal
//! report is issued at the end of the pass — never per node.

mod stats;

pub use stats::RunStats;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::inventory::{InventoryError, NodeInventory};
use crate::probe::Prober;
use crate::report::{HealthReporter, ReportError};
use crate::selection::{is_ready, ExcludeList};

/// Fatal run errors.
///
/// Probe failures never appear here; they are demoted to diagnostic
/// strings in the failure report.
#[derive(Debug, Error)]
pub enum RunError {
    /// The node inventory could not be fetched. A failure report is
    /// attempted before this is returned.
    #[error("inventory fetch failed: {0}")]
    Inventory(#[from] InventoryError),

    /// The terminal report could not be delivered.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The run was cancelled before the terminal report. No report is
    /// issued on this path.
    #[error("run cancelled before completion")]
    Cancelled,
}

/// Ordered accumulator of per-node failure messages for one pass.
///
/// Created at run start, appended to as checks fail, consumed exactly once
/// at report time.
#[derive(Debug, Default)]
pub struct RunReport {
    messages: Vec<String>,
}

impl RunReport {
    /// Empty report (success so far).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure message.
    pub fn record(&mut self, message: String) {
        self.messages.push(message);
    }

    /// Whether no failures were recorded.
    pub fn is_success(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the report, yielding the messages in recording order.
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// One health-check run over the cluster.
///
/// Generic over the three collaborator seams so tests can drive the
/// orchestration with spies.
pub struct CheckRun<I, P, R> {
    inventory: I,
    prober: P,
    reporter: R,
    exclude: ExcludeList,
}

impl<I, P, R> CheckRun<I, P, R>
where
    I: NodeInventory,
    P: Prober,
    R: HealthReporter,
{
    /// Assemble a run from its collaborators and the exclusion set.
    pub fn new(inventory: I, prober: P, reporter: R, exclude: ExcludeList) -> Self {
        Self {
            inventory,
            prober,
            reporter,
            exclude,
        }
    }

    /// Execute one full pass and issue the terminal report.
    ///
    /// Returns the run counters on a delivered report, or a fatal
    /// [`RunError`]. Cancellation aborts without any report, so a
    /// partially checked cluster never shows up as healthy.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunStats, RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let nodes = tokio::select! {
            _ = cancel.cancelled() => return Err(RunError::Cancelled),
            result = self.inventory.list_nodes() => match result {
                Ok(nodes) => nodes,
                Err(e) => {
                    // Fatal, but try to surface it at the reporting sink
                    // before giving up.
                    error!(error = %e, "failed to fetch node inventory");
                    if let Err(report_err) =
                        self.reporter.report_failure(vec![e.to_string()]).await
                    {
                        error!(error = %report_err, "failed to report inventory error");
                    }
                    return Err(RunError::Inventory(e));
                }
            },
        };

        info!(nodes = nodes.len(), "node inventory fetched");

        let mut stats = RunStats::new(nodes.len());
        let mut report = RunReport::new();

        for node in &nodes {
            if self.exclude.contains(&node.name) {
                debug!(node = %node.name, "excluded, skipping");
                stats.excluded += 1;
                continue;
            }
            if !is_ready(node) {
                debug!(node = %node.name, "not ready, skipping");
                stats.not_ready += 1;
                continue;
            }

            stats.probed += 1;
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(RunError::Cancelled),
                result = self.prober.probe(node) => result,
            };

            if let Err(e) = result {
                warn!(node = %node.name, error = %e, "node check failed");
                stats.failed += 1;
                report.record(e.to_string());
            }
        }

        if report.is_success() {
            if stats.probed == 0 {
                // Vacuous success: nothing was eligible for checking.
                warn!(
                    nodes = stats.nodes_total,
                    excluded = stats.excluded,
                    not_ready = stats.not_ready,
                    "no ready, non-excluded nodes to check; reporting success"
                );
            }
            self.reporter.report_success().await?;
        } else {
            self.reporter.report_failure(report.into_messages()).await?;
        }

        info!(
            probed = stats.probed,
            failed = stats.failed,
            excluded = stats.excluded,
            not_ready = stats.not_ready,
            "run complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_starts_successful() {
        let report = RunReport::new();
        assert!(report.is_success());
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn test_run_report_preserves_recording_order() {
        let mut report = RunReport::new();
        report.record("first".to_string());
        report.record("second".to_string());

        assert!(!report.is_success());
        assert_eq!(report.len(), 2);
        assert_eq!(report.into_messages(), vec!["first", "second"]);
    }
}
