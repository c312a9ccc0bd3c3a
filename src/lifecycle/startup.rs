//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last so traffic only arrives once the wallet is ready

use std::time::Duration;

use thiserror::Error;

use crate::blockchain::{BlockchainError, SharedVerifier, WalletRpcClient};
use crate::config::ProxyConfig;
use crate::http::{ChallengeResponder, ProxyServer, SessionContext, TemplateError};
use crate::net::{Listener, ListenerError, UpstreamConnector, UpstreamError};
use crate::payments::{Policy, PolicyError};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("payment policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("wallet: {0}")]
    Wallet(#[from] BlockchainError),

    #[error("challenge templates: {0}")]
    Template(#[from] TemplateError),

    #[error("upstream: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("listener: {0}")]
    Listener(#[from] ListenerError),
}

/// Connect to the wallet and build a ready-to-run server.
///
/// `config` is expected to be validated already.
pub async fn bootstrap(config: &ProxyConfig) -> Result<(ProxyServer, Listener), StartupError> {
    let policy = Policy::from_config(&config.payment)?;

    let wallet = WalletRpcClient::new(config.wallet.clone())?;
    wallet.open_wallet().await?;
    let address = wallet.verify_network().await?;
    tracing::info!(network = %config.wallet.network, address = %address, "Wallet connected");

    let verifier = SharedVerifier::new(wallet, Duration::from_secs(config.timeouts.verify_secs)).await?;
    let height = verifier.current_height().await?;
    tracing::info!(height, "Wallet synchronized");

    assemble(config, policy, verifier).await
}

/// Build the server around an existing verifier.
pub async fn assemble(
    config: &ProxyConfig,
    policy: Policy,
    verifier: SharedVerifier,
) -> Result<(ProxyServer, Listener), StartupError> {
    let responder = ChallengeResponder::new(verifier.address())?;
    let upstream = UpstreamConnector::resolve(&config.upstream, &config.timeouts).await?;

    tracing::info!(
        scheme = %policy.scheme(),
        min_amount = policy.min_amount_text(),
        min_confirmations = policy.min_confirmations(),
        max_confirmations = policy.max_confirmations(),
        "Payment policy loaded"
    );

    let context = SessionContext {
        policy,
        verifier,
        responder,
        idle_timeout: Duration::from_secs(config.timeouts.idle_secs),
        upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
    };
    let server = ProxyServer::new(
        context,
        upstream,
        Duration::from_secs(config.timeouts.shutdown_grace_secs),
    );

    let listener = Listener::bind(&config.listener).await?;
    Ok((server, listener))
}
