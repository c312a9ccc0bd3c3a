//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable via `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xmr402={},hyper=warn", config.log_level)))
}

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(config: &ObservabilityConfig) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
