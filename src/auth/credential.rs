//! Credential decoding from `Authorization` header values.
//!
//! Accepted token formats:
//! - `Bearer <txid-hex>:<signature>`
//! - `Basic <base64(txid-hex:signature)>`

use std::fmt;
use std::str::FromStr;

use base64::prelude::*;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a hex-encoded transaction id.
pub const TX_REFERENCE_HEX_LEN: usize = 64;

/// Shortest token that can hold `x:y`.
const MIN_TOKEN_LEN: usize = 3;

/// HTTP authentication scheme the proxy challenges with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl AuthScheme {
    /// Scheme name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "Basic",
            AuthScheme::Bearer => "Bearer",
        }
    }

    /// Header value prefix, including the separating space.
    fn prefix(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "Basic ",
            AuthScheme::Bearer => "Bearer ",
        }
    }

    /// Status code used when a request under this scheme is rejected.
    ///
    /// Browsers only prompt for credentials on `401` with `Basic`, so every
    /// other scheme answers `402 Payment Required`.
    pub fn challenge_status(&self) -> StatusCode {
        match self {
            AuthScheme::Basic => StatusCode::UNAUTHORIZED,
            AuthScheme::Bearer => StatusCode::PAYMENT_REQUIRED,
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown scheme name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported authorization scheme '{0}' (expected Basic or Bearer)")]
pub struct UnknownScheme(pub String);

impl FromStr for AuthScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Basic" => Ok(AuthScheme::Basic),
            "Bearer" => Ok(AuthScheme::Bearer),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}

/// A 32-byte transaction id, parsed from exactly 64 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxReference([u8; 32]);

impl FromStr for TxReference {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TX_REFERENCE_HEX_LEN {
            return Err(DecodeError::MalformedReference);
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| DecodeError::MalformedReference)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A decoded payment credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: AuthScheme,
    pub tx_reference: TxReference,
    pub signature: String,
}

/// Reasons an `Authorization` value cannot be turned into a [`Credential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The header does not start with the configured scheme.
    #[error("Authorization scheme does not match the expected scheme")]
    WrongScheme,

    /// The token is not `<txid>:<signature>` (or not valid base64 for Basic).
    #[error("Token must be of the form <txid>:<tx_proof>")]
    MalformedToken,

    /// The transaction id is not 64 hex characters.
    #[error("Transaction id must be 64 hexadecimal characters")]
    MalformedReference,
}

/// Decode an `Authorization` header value under `scheme`.
pub fn decode(header_value: &str, scheme: AuthScheme) -> Result<Credential, DecodeError> {
    let token = header_value
        .strip_prefix(scheme.prefix())
        .ok_or(DecodeError::WrongScheme)?
        .trim();

    let token = match scheme {
        AuthScheme::Basic => {
            let raw = BASE64_STANDARD
                .decode(token)
                .map_err(|_| DecodeError::MalformedToken)?;
            String::from_utf8(raw).map_err(|_| DecodeError::MalformedToken)?
        }
        AuthScheme::Bearer => token.to_string(),
    };

    if token.len() < MIN_TOKEN_LEN {
        return Err(DecodeError::MalformedToken);
    }
    let (reference, signature) = token.split_once(':').ok_or(DecodeError::MalformedToken)?;
    if reference.is_empty() || signature.is_empty() {
        return Err(DecodeError::MalformedToken);
    }

    Ok(Credential {
        scheme,
        tx_reference: reference.parse()?,
        signature: signature.to_string(),
    })
}
