//! sshpulse - SSH reachability health check for cluster nodes.
//!
//! This library implements the node-selection and verification pipeline:
//! fetch the cluster's node inventory once, drop excluded and not-Ready
//! nodes, probe SSH reachability on each remaining node, and deliver
//! exactly one aggregate report to the health-reporting endpoint.
//!
//! # High-Level API
//!
//! ```ignore
//! use sshpulse::config::CheckConfig;
//! use sshpulse::inventory::KubeApiInventory;
//! use sshpulse::probe::SshProber;
//! use sshpulse::report::KuberhealthyReporter;
//! use sshpulse::runner::CheckRun;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = CheckConfig::from_env()?;
//! let inventory = KubeApiInventory::from_cluster_env().await?;
//! let prober = SshProber::new(&config.private_key, &config.username);
//! let reporter = KuberhealthyReporter::new(&config.reporting_url, config.run_uuid.clone())?;
//!
//! let run = CheckRun::new(inventory, prober, reporter, config.exclude.clone());
//! let stats = run.run(&CancellationToken::new()).await?;
//! ```

pub mod config;
pub mod inventory;
pub mod logging;
pub mod node;
pub mod probe;
pub mod report;
pub mod runner;
pub mod selection;

/// Version of the sshpulse library and CLI.
///
/// Synchronized across the workspace; injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
