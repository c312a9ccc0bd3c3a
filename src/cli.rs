//! Command-line interface.
//!
//! Flags override values from the optional configuration file.

use std::path::PathBuf;

use clap::Parser;

use crate::auth::AuthScheme;
use crate::blockchain::Network;
use crate::config::{read_config, ConfigError, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "xmr402")]
#[command(about = "Reverse proxy that admits requests paid in Monero", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Upstream service as host:port.
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Authorization scheme clients must use (Basic or Bearer).
    #[arg(long)]
    pub scheme: Option<AuthScheme>,

    /// Minimum payment in XMR, e.g. 0.01.
    #[arg(long)]
    pub min_amount: Option<String>,

    #[arg(long)]
    pub min_confirmations: Option<u64>,

    #[arg(long)]
    pub max_confirmations: Option<u64>,

    /// Wallet JSON-RPC endpoint.
    #[arg(long)]
    pub wallet_rpc: Option<String>,

    /// Monero network (mainnet, testnet, stagenet).
    #[arg(long)]
    pub network: Option<Network>,

    /// Wallet file to open on startup.
    #[arg(long)]
    pub wallet_file: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Read the configuration file (or defaults) and apply flag overrides.
    ///
    /// The result is not validated.
    pub fn resolve_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(upstream) = &self.upstream {
            config.upstream.address = upstream.clone();
        }
        if let Some(scheme) = self.scheme {
            config.payment.auth_scheme = scheme;
        }
        if let Some(amount) = &self.min_amount {
            config.payment.min_amount = amount.clone();
        }
        if let Some(min) = self.min_confirmations {
            config.payment.min_confirmations = min;
        }
        if let Some(max) = self.max_confirmations {
            config.payment.max_confirmations = max;
        }
        if let Some(url) = &self.wallet_rpc {
            config.wallet.rpc_url = url.clone();
        }
        if let Some(network) = self.network {
            config.wallet.network = network;
        }
        if let Some(file) = &self.wallet_file {
            config.wallet.wallet_file = Some(file.clone());
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr.clone();
        }
    }
}
