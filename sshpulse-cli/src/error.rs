//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and an appropriate exit code for each fatal path.

use std::fmt;
use std::process;

use sshpulse::config::ConfigError;
use sshpulse::inventory::InventoryError;
use sshpulse::runner::RunError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigError),
    /// Failed to build the cluster inventory client
    Inventory(InventoryError),
    /// The check run failed fatally
    Run(RunError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Required environment:");
                eprintln!("  SSH_PRIVATE_KEY   private key material for ssh auth");
                eprintln!("  SSH_USERNAME      username for ssh auth");
                eprintln!("  KH_REPORTING_URL  health-reporting endpoint");
                eprintln!();
                eprintln!("Optional: SSH_EXCLUDE_LIST, SSH_PORT, SSH_TIMEOUT_SECONDS,");
                eprintln!("          SSH_HOST_KEY_POLICY (accept-any|known-hosts), KH_RUN_UUID");
            }
            CliError::Inventory(_) => {
                eprintln!();
                eprintln!("The cluster client uses the in-cluster service account:");
                eprintln!("  1. KUBERNETES_SERVICE_HOST / KUBERNETES_SERVICE_PORT must be set");
                eprintln!("  2. The service-account token volume must be mounted");
                eprintln!("  3. The service account needs permission to list nodes");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Inventory(e) => write!(f, "Cluster client error: {}", e),
            CliError::Run(e) => write!(f, "Check run failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Inventory(e) => Some(e),
            CliError::Run(e) => Some(e),
            _ => None,
        }
    }
}
