//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the filter: `RUST_LOG` first, then the configured level
//!
//! # Design Decisions
//! - JSON lines for production, human-readable format for development
//! - Only this crate and `tower_http` log at the configured level by default

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Directives used when `RUST_LOG` is unset or unparseable.
pub fn default_directives(level: &str) -> String {
    format!("flecto_manager={level},tower_http={level}")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = env_filter(&config.log_level);
    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives("debug"),
            "flecto_manager=debug,tower_http=debug"
        );
        assert!(EnvFilter::try_new(default_directives("warn")).is_ok());
    }
}
