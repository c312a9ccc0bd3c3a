//! Payment-gated HTTP reverse proxy for Monero.
//!
//! Requests must carry a transaction proof in their `Authorization` header.
//! The proof is checked against a wallet; paid requests are forwarded to the
//! upstream service, everything else gets a `WWW-Authenticate` challenge.

pub mod auth;
pub mod blockchain;
pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod payments;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
