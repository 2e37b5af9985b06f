//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for applications that want one
//! - Resolve the log filter from the environment, then config
//!
//! # Design Decisions
//! - Calling init twice returns an error instead of panicking

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` when set and valid, else the configured one.
pub fn resolve_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
}

/// Install a registry with an env filter and a fmt layer.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(resolve_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(filter = %config.log_filter, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_error() {
        let config = ObservabilityConfig::default();
        // Another test may already own the global subscriber.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
