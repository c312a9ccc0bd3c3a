//! Session identity and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count live sessions for graceful shutdown and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Relaxed ordering is enough: ids only need to be unique.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Counts live sessions.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session. The guard unregisters it on drop.
    pub fn track(&self) -> ConnectionGuard {
        let now = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_sessions(now);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every session has ended or `grace` elapses.
    ///
    /// Returns `true` if all sessions drained in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        let poll = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(grace, poll).await.is_ok()
    }
}

/// Tracks one session's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let now = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_sessions(now);
        tracing::trace!(connection_id = %self.id, "Session ended");
    }
}
