//! Payment decision types.

use thiserror::Error;

use crate::auth::{AuthScheme, DecodeError, TxReference};
use crate::payments::amount::AtomicAmount;

/// Why a request was refused.
///
/// The `Display` text is sent to clients as `error_description`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("Authorization scheme must be {expected}")]
    WrongScheme { expected: AuthScheme },

    #[error("Token must be of the form <txid>:<tx_proof>")]
    MalformedToken,

    #[error("Transaction id must be 64 hexadecimal characters")]
    MalformedReference,

    #[error("Transaction proof is not valid for this address")]
    ProofInvalid,

    #[error("Transaction is still in the pool")]
    InMempool,

    #[error("Transaction has {confirmations} confirmations, at least {required} required")]
    BelowMinConfirmations { confirmations: u64, required: u64 },

    #[error("Transaction has {confirmations} confirmations, at most {allowed} allowed")]
    AboveMaxConfirmations { confirmations: u64, allowed: u64 },

    #[error("Received {received} XMR, at least {required} XMR required")]
    BelowMinAmount {
        received: AtomicAmount,
        required: AtomicAmount,
    },

    /// The verifier could not answer; carries its message.
    #[error("{0}")]
    Unverifiable(String),
}

impl FailureReason {
    /// Map a decode failure under the configured `scheme`.
    pub fn from_decode(err: DecodeError, scheme: AuthScheme) -> Self {
        match err {
            DecodeError::WrongScheme => FailureReason::WrongScheme { expected: scheme },
            DecodeError::MalformedToken => FailureReason::MalformedToken,
            DecodeError::MalformedReference => FailureReason::MalformedReference,
        }
    }

    /// Stable machine-readable name, used for metric labels and logs.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::WrongScheme { .. } => "wrong_scheme",
            FailureReason::MalformedToken => "malformed_token",
            FailureReason::MalformedReference => "malformed_reference",
            FailureReason::ProofInvalid => "proof_invalid",
            FailureReason::InMempool => "in_mempool",
            FailureReason::BelowMinConfirmations { .. } => "below_min_confirmations",
            FailureReason::AboveMaxConfirmations { .. } => "above_max_confirmations",
            FailureReason::BelowMinAmount { .. } => "below_min_amount",
            FailureReason::Unverifiable(_) => "unverifiable",
        }
    }
}

/// A payment that satisfied the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub tx_reference: TxReference,
    pub amount: AtomicAmount,
    pub confirmations: u64,
}

/// Accept/reject outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(Payment),
    /// `None` when no credential was presented at all.
    Rejected(Option<FailureReason>),
}

impl Decision {
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Decision::Accepted(_) => None,
            Decision::Rejected(reason) => reason.as_ref(),
        }
    }
}
