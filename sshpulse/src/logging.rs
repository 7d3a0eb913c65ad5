//! Logging infrastructure.
//!
//! Structured logging to stdout via `tracing`, configurable through the
//! `RUST_LOG` environment variable. The check runs as a short-lived pod,
//! so stdout is the only sink.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Defaults to `info` level when `RUST_LOG` is not set; `debug_mode`
/// forces debug level regardless of the environment.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(debug_mode: bool) -> Result<(), io::Error> {
    let default_level = if debug_mode { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_errors() {
        // The global subscriber can only be installed once per process;
        // the second call must fail cleanly rather than panic.
        let first = init_logging(false);
        let second = init_logging(false);
        assert!(first.is_ok() || second.is_err());
    }
}
