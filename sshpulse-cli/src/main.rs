//! sshpulse CLI - run one SSH reachability check over the cluster.
//!
//! The binary is a one-shot pod: it loads configuration from the
//! environment, runs a single pass over the node inventory, delivers
//! exactly one report, and exits. A non-zero exit marks a fatal path
//! (configuration, inventory, or report delivery failure).

mod error;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sshpulse::config::CheckConfig;
use sshpulse::inventory::KubeApiInventory;
use sshpulse::probe::SshProber;
use sshpulse::report::{HealthReporter, KuberhealthyReporter};
use sshpulse::runner::{CheckRun, RunError};

use error::CliError;

#[derive(Parser)]
#[command(name = "sshpulse")]
#[command(version = sshpulse::VERSION)]
#[command(about = "SSH reachability health check for cluster nodes", long_about = None)]
struct Args {
    /// Enable debug-level logging regardless of RUST_LOG
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        e.exit();
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    sshpulse::logging::init_logging(args.debug)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    info!("sshpulse v{}", sshpulse::VERSION);

    let config = CheckConfig::from_env().map_err(CliError::Config)?;

    let reporter = KuberhealthyReporter::new(&config.reporting_url, config.run_uuid.clone())
        .map_err(|e| CliError::Run(RunError::Report(e)))?;

    // Cluster client setup failure is fatal, but still surfaced at the
    // reporting sink so the check shows as failed rather than missing.
    let inventory = match KubeApiInventory::from_cluster_env().await {
        Ok(inventory) => inventory,
        Err(e) => {
            if let Err(report_err) = reporter.report_failure(vec![e.to_string()]).await {
                warn!(error = %report_err, "failed to report cluster setup error");
            }
            return Err(CliError::Inventory(e));
        }
    };
    info!("cluster client created");

    let prober = SshProber::new(&config.private_key, &config.username)
        .with_port(config.port)
        .with_timeout(config.dial_timeout)
        .with_host_key_policy(config.host_key_policy);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, aborting run");
            signal_cancel.cancel();
        }
    });

    let run = CheckRun::new(inventory, prober, reporter, config.exclude.clone());
    let stats = run.run(&cancel).await.map_err(CliError::Run)?;

    info!(
        probed = stats.probed,
        succeeded = stats.succeeded(),
        failed = stats.failed,
        "check finished"
    );
    Ok(())
}
