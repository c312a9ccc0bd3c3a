//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + command-line overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → lifecycle::startup builds Policy, verifier and server from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the payment policy never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    ListenerConfig, ObservabilityConfig, PaymentConfig, ProxyConfig, TimeoutConfig, UpstreamConfig,
    WalletConfig,
};
pub use validation::{validate_config, ValidationError};
