//! Accept loop.
//!
//! # Responsibilities
//! - Accept client connections within the connection limit
//! - Open one upstream connection per client and hand both to a session
//! - Stop accepting on shutdown and drain in-flight sessions
//!
//! # Design Decisions
//! - Accepting is the only serialized step; every session runs on its own task
//! - An unreachable upstream drops that client only, the loop keeps accepting

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::http::session::{run_session, SessionContext};
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError, UpstreamConnector};

const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// The payment-gated proxy.
pub struct ProxyServer {
    context: Arc<SessionContext>,
    upstream: UpstreamConnector,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl ProxyServer {
    pub fn new(context: SessionContext, upstream: UpstreamConnector, shutdown_grace: Duration) -> Self {
        Self {
            context: Arc::new(context),
            upstream,
            tracker: ConnectionTracker::new(),
            shutdown_grace,
        }
    }

    /// Accept until `shutdown` fires, then wait for sessions to finish.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                upstream = ?self.upstream.addrs(),
                max_connections = listener.max_connections(),
                "Proxy listening"
            );
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_session(stream, peer, permit),
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
                    }
                    Err(e) => return Err(e),
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting");
                    break;
                }
            }
        }

        drop(listener);
        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, grace = ?self.shutdown_grace, "Draining sessions");
        }
        if !self.tracker.drain(self.shutdown_grace).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Grace period elapsed with sessions still open"
            );
        }
        Ok(())
    }

    fn spawn_session(&self, client: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let context = self.context.clone();
        let upstream = self.upstream.clone();
        let span = tracing::info_span!("session", connection_id = %guard.id(), peer_addr = %peer);

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                tracing::debug!("Client connected");

                let upstream = match upstream.connect().await {
                    Ok(stream) => stream,
                    Err(e) => {
                        tracing::error!(error = %e, "Upstream unavailable, dropping client");
                        return;
                    }
                };

                match run_session(context, client, upstream).await {
                    Ok(()) => tracing::debug!("Session closed"),
                    Err(e) => tracing::info!(error = %e, "Session aborted"),
                }
            }
            .instrument(span),
        );
    }
}
