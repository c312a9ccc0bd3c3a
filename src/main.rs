//! xmr402: a reverse proxy that admits requests paid in Monero.
//!
//! ```text
//!   client ──▶ net::Listener ──▶ http::session ──▶ upstream service
//!                                   │     ▲
//!                        credential │     │ challenge (401/402)
//!                                   ▼     │
//!                          payments::evaluate ──▶ wallet RPC
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use xmr402::cli::Cli;
use xmr402::config::{validate_config, ConfigError, ObservabilityConfig};
use xmr402::lifecycle::{bootstrap, signals, Shutdown};
use xmr402::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Cannot load configuration");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.observability);

    if let Err(errors) = validate_config(&config) {
        tracing::error!(error = %ConfigError::Validation(errors), "Invalid configuration");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "xmr402 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (server, listener) = match bootstrap(&config).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    if let Err(e) = server.run(listener, stop).await {
        tracing::error!(error = %e, "Proxy stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
