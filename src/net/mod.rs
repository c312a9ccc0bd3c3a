//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (session id, live session tracking)
//!     → upstream.rs (one upstream connection per client connection)
//!     → Hand off to http::session
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each session tracked for graceful shutdown
//! - Upstream resolved once at startup; resolution failure is fatal

pub mod connection;
pub mod listener;
pub mod upstream;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use upstream::{UpstreamConnector, UpstreamError};
