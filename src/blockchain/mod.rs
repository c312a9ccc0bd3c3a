//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Config (wallet RPC URL, network, wallet file)
//!     → client.rs (monero-wallet-rpc JSON-RPC with timeouts)
//!     → verifier.rs (PaymentVerifier trait, SharedVerifier handle)
//!     → payments::policy (threshold evaluation)
//! ```
//!
//! # Security Constraints
//! - Wallet password ONLY from environment variables
//! - Never log passwords or proofs
//! - All RPC calls have configurable timeouts
//! - Verifier calls are serialized behind one lock

pub mod client;
pub mod types;
pub mod verifier;

pub use client::WalletRpcClient;
pub use types::{BlockchainError, BlockchainResult, Network, VerificationResult, WalletConfig};
pub use verifier::{PaymentVerifier, SharedVerifier};
