//! Payment policy subsystem.
//!
//! # Data Flow
//! ```text
//! Credential (auth::credential)
//!     → blockchain::SharedVerifier (refresh + check_tx_proof)
//!     → policy.rs (fixed-order threshold checks)
//!     → Decision { Accepted(Payment) | Rejected(Option<FailureReason>) }
//! ```

pub mod amount;
pub mod policy;
pub mod types;

pub use amount::AtomicAmount;
pub use policy::{evaluate, Policy, PolicyError};
pub use types::{Decision, FailureReason, Payment};
