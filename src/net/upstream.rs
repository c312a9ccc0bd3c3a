//! Upstream resolution and connection establishment.
//!
//! The upstream host is resolved once at startup; every accepted client
//! connection gets its own upstream connection.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::resilience::timeouts::deadline;

/// Errors resolving or connecting to the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot resolve upstream '{address}': {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upstream '{0}' resolved to no addresses")]
    NoAddresses(String),

    #[error("cannot connect to upstream after {attempts} attempts: {last}")]
    Connect { attempts: u32, last: String },
}

/// Connects to the resolved upstream addresses.
#[derive(Debug, Clone)]
pub struct UpstreamConnector {
    addrs: Vec<SocketAddr>,
    connect_timeout: Duration,
    attempts: u32,
    backoff: Backoff,
}

impl UpstreamConnector {
    /// Resolve the configured upstream address.
    pub async fn resolve(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let addrs: Vec<SocketAddr> = lookup_host(config.address.as_str())
            .await
            .map_err(|source| UpstreamError::Resolve {
                address: config.address.clone(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(UpstreamError::NoAddresses(config.address.clone()));
        }

        tracing::info!(upstream = %config.address, resolved = ?addrs, "Upstream resolved");

        Ok(Self {
            addrs,
            connect_timeout: Duration::from_secs(timeouts.connect_secs),
            attempts: config.connect_attempts.max(1),
            backoff: Backoff::from_config(config),
        })
    }

    /// Connector for fixed addresses; used when the address is already known.
    pub fn with_addrs(addrs: Vec<SocketAddr>, connect_timeout: Duration, attempts: u32, backoff: Backoff) -> Self {
        Self {
            addrs,
            connect_timeout,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Open a connection, trying each resolved address per attempt.
    pub async fn connect(&self) -> Result<TcpStream, UpstreamError> {
        let mut last = String::from("no address tried");

        for attempt in 1..=self.attempts {
            for addr in &self.addrs {
                match deadline("upstream connect", self.connect_timeout, TcpStream::connect(addr)).await {
                    Ok(Ok(stream)) => {
                        let _ = stream.set_nodelay(true);
                        return Ok(stream);
                    }
                    Ok(Err(e)) => last = format!("{}: {}", addr, e),
                    Err(elapsed) => last = format!("{}: {}", addr, elapsed),
                }
            }

            metrics::record_upstream_connect_failure();
            tracing::warn!(attempt, error = %last, "Upstream connect failed");
            if attempt < self.attempts {
                tokio::time::sleep(self.backoff.delay(attempt)).await;
            }
        }

        Err(UpstreamError::Connect {
            attempts: self.attempts,
            last,
        })
    }
}
