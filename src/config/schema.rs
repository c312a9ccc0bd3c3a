//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::auth::AuthScheme;
use crate::blockchain::Network;

/// Root configuration for the payment proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Upstream server every paid request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Payment thresholds and authorization scheme.
    pub payment: PaymentConfig,

    /// Wallet RPC used to verify payments.
    pub wallet: WalletConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
        }
    }
}

/// Upstream server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address as `host:port`; the host may be a name.
    pub address: String,

    /// Connect attempts per client connection.
    pub connect_attempts: u32,

    /// Base delay for exponential backoff between attempts, in milliseconds.
    pub backoff_base_ms: u64,

    /// Maximum backoff delay in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".to_string(),
            connect_attempts: 3,
            backoff_base_ms: 50,
            backoff_max_ms: 500,
        }
    }
}

/// Payment requirements.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Authorization scheme clients must use.
    pub auth_scheme: AuthScheme,

    /// Minimum amount in XMR, as a decimal string (e.g. "0.01").
    pub min_amount: String,

    /// Minimum confirmations, inclusive.
    pub min_confirmations: u64,

    /// Maximum confirmations, inclusive. Older payments are considered spent.
    pub max_confirmations: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            auth_scheme: AuthScheme::Bearer,
            min_amount: "0.01".to_string(),
            min_confirmations: 3,
            max_confirmations: 150,
        }
    }
}

/// Wallet RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// `monero-wallet-rpc` JSON-RPC endpoint.
    pub rpc_url: String,

    /// Network the wallet's address must belong to.
    pub network: Network,

    /// Wallet file to open at startup. `None` uses the wallet already open.
    pub wallet_file: Option<String>,

    /// Environment variable holding the wallet password.
    pub password_env: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:18083/json_rpc".to_string(),
            network: Network::Mainnet,
            wallet_file: None,
            password_env: "XMR402_WALLET_PASSWORD".to_string(),
            rpc_timeout_secs: 30,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time a client connection may sit without sending a request, in seconds.
    pub idle_secs: u64,

    /// Payment verification deadline in seconds.
    pub verify_secs: u64,

    /// Upstream request/response exchange deadline in seconds.
    pub upstream_secs: u64,

    /// How long in-flight sessions may drain on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            idle_secs: 60,
            verify_secs: 30,
            upstream_secs: 60,
            shutdown_grace_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
