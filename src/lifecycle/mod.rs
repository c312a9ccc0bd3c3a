//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Policy → Wallet → Verifier → Templates → Upstream → Listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain sessions → Exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{assemble, bootstrap, StartupError};
