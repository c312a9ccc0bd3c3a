//! OS signal handling.
//!
//! SIGINT (Ctrl-C) and SIGTERM both request a graceful shutdown.

use crate::lifecycle::shutdown::Shutdown;

/// Resolve when the process is asked to stop.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Trigger `shutdown` on the first signal.
pub fn spawn_signal_handler(shutdown: Shutdown) {
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });
}
