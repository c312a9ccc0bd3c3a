//! Authorization credential handling.
//!
//! # Data Flow
//! ```text
//! Authorization: <Scheme> <token>
//!     → credential.rs (scheme prefix, base64 for Basic, txid:signature split)
//!     → Credential { scheme, tx_reference, signature }
//!     → payments::policy (threshold evaluation)
//! ```
//!
//! # Design Decisions
//! - Decoding is pure: the same header value always yields the same result
//! - Failures are values (`DecodeError`), surfaced to the client as a challenge

pub mod credential;

pub use credential::{decode, AuthScheme, Credential, DecodeError, TxReference};
