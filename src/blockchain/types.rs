//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::timeouts::Elapsed;

// Re-export WalletConfig from config module to avoid duplication
pub use crate::config::schema::WalletConfig;

/// Monero network a wallet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Stagenet,
}

impl Network {
    /// Leading characters of standard, integrated and subaddresses on this network.
    fn address_prefixes(&self) -> &'static [char] {
        match self {
            Network::Mainnet => &['4', '8'],
            Network::Testnet => &['9', 'A', 'B'],
            Network::Stagenet => &['5', '7'],
        }
    }

    /// Whether `address` looks like an address of this network.
    pub fn matches_address(&self, address: &str) -> bool {
        address
            .chars()
            .next()
            .is_some_and(|c| self.address_prefixes().contains(&c))
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Stagenet => "stagenet",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Network {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "stagenet" => Ok(Network::Stagenet),
            other => Err(BlockchainError::NotAvailable(format!("unknown network '{}'", other))),
        }
    }
}

/// Errors that can occur during wallet and chain queries.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The wallet answered with a JSON-RPC error object.
    #[error("Wallet RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Refresh plus proof check exceeded the verify deadline.
    #[error(transparent)]
    Deadline(#[from] Elapsed),

    /// Wallet address does not belong to the configured network.
    #[error("Wallet address {address} does not belong to {expected}")]
    NetworkMismatch { expected: Network, address: String },

    /// Wallet could not be opened or is not configured.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Verifier not initialized or disabled.
    #[error("Verifier not available: {0}")]
    NotAvailable(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Outcome of checking a transaction proof against the receiving address.
///
/// Produced fresh for every request; confirmations and pool membership
/// change over time so results are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Amount received by the address in the transaction, in piconero.
    pub amount_received: u64,
    /// Blocks mined on top of the transaction's block.
    pub confirmations: u64,
    /// Transaction is still in the pool.
    pub in_mempool: bool,
    /// Signature proves the transaction paid the address.
    pub proof_valid: bool,
}
