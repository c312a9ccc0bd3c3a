//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream connect:
//!     → timeouts.rs (per-attempt connect deadline)
//!     → On failure: backoff.rs (jittered exponential delay, bounded attempts)
//!
//! Upstream exchange:
//!     → timeouts.rs (request/response deadline; expiry aborts the session)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Requests are never retried: a forwarded request may have side effects upstream

pub mod backoff;
pub mod timeouts;
