//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, confirmation window ordered)
//! - Check addresses, URLs and amounts parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::payments::AtomicAmount;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroConnections,

    #[error("upstream.address '{0}' must be host:port")]
    UpstreamAddress(String),

    #[error("upstream.connect_attempts must be greater than zero")]
    ZeroConnectAttempts,

    #[error("payment.min_amount: {0}")]
    MinAmount(String),

    #[error("payment.min_confirmations ({min}) exceeds payment.max_confirmations ({max})")]
    ConfirmationWindow { min: u64, max: u64 },

    #[error("wallet.rpc_url '{0}' is not a valid URL")]
    WalletUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let upstream = &config.upstream.address;
    match upstream.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
        _ => errors.push(ValidationError::UpstreamAddress(upstream.clone())),
    }
    if config.upstream.connect_attempts == 0 {
        errors.push(ValidationError::ZeroConnectAttempts);
    }

    if let Err(e) = config.payment.min_amount.parse::<AtomicAmount>() {
        errors.push(ValidationError::MinAmount(e.to_string()));
    }
    if config.payment.min_confirmations > config.payment.max_confirmations {
        errors.push(ValidationError::ConfirmationWindow {
            min: config.payment.min_confirmations,
            max: config.payment.max_confirmations,
        });
    }

    if config.wallet.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::WalletUrl(config.wallet.rpc_url.clone()));
    }

    let timeouts = [
        ("wallet.rpc_timeout_secs", config.wallet.rpc_timeout_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.idle_secs", config.timeouts.idle_secs),
        ("timeouts.verify_secs", config.timeouts.verify_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
