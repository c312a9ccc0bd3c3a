//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
    /// The connection limiter was closed.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
            ListenerError::Closed => write!(f, "Connection limiter closed"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// A bounded TCP listener that limits concurrent client connections.
///
/// When the limit is reached, accepting waits until a session ends.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// The returned permit must be held for the session's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A connection slot, released when dropped.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
