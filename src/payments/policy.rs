//! Threshold policy: turn a credential plus verification result into a decision.
//!
//! Checks run in a fixed order and stop at the first failure:
//! scheme → token shape → txid shape → proof → pool → confirmation floor →
//! confirmation ceiling → amount floor.

use thiserror::Error;

use crate::auth::{self, AuthScheme};
use crate::blockchain::{SharedVerifier, VerificationResult};
use crate::config::PaymentConfig;
use crate::observability::metrics;
use crate::payments::amount::{AmountError, AtomicAmount};
use crate::payments::types::{Decision, FailureReason, Payment};

/// Errors building a [`Policy`] from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid min_amount: {0}")]
    Amount(#[from] AmountError),

    #[error("min_confirmations ({min}) is greater than max_confirmations ({max})")]
    InvertedWindow { min: u64, max: u64 },
}

/// Process-wide payment requirements. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    scheme: AuthScheme,
    min_amount: AtomicAmount,
    min_amount_text: String,
    min_confirmations: u64,
    max_confirmations: u64,
}

impl Policy {
    /// Build a policy; `min_amount` is decimal XMR.
    pub fn new(
        scheme: AuthScheme,
        min_amount: &str,
        min_confirmations: u64,
        max_confirmations: u64,
    ) -> Result<Self, PolicyError> {
        let parsed: AtomicAmount = min_amount.parse()?;
        if min_confirmations > max_confirmations {
            return Err(PolicyError::InvertedWindow {
                min: min_confirmations,
                max: max_confirmations,
            });
        }
        Ok(Self {
            scheme,
            min_amount: parsed,
            min_amount_text: min_amount.trim().to_string(),
            min_confirmations,
            max_confirmations,
        })
    }

    pub fn from_config(config: &PaymentConfig) -> Result<Self, PolicyError> {
        Self::new(
            config.auth_scheme,
            &config.min_amount,
            config.min_confirmations,
            config.max_confirmations,
        )
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// The minimum amount exactly as configured, for challenges.
    pub fn min_amount_text(&self) -> &str {
        &self.min_amount_text
    }

    pub fn min_confirmations(&self) -> u64 {
        self.min_confirmations
    }

    pub fn max_confirmations(&self) -> u64 {
        self.max_confirmations
    }

    /// Apply the verification checks to `result`.
    pub fn check(&self, result: &VerificationResult) -> Result<(), FailureReason> {
        if !result.proof_valid {
            return Err(FailureReason::ProofInvalid);
        }
        if result.in_mempool {
            return Err(FailureReason::InMempool);
        }
        if result.confirmations < self.min_confirmations {
            return Err(FailureReason::BelowMinConfirmations {
                confirmations: result.confirmations,
                required: self.min_confirmations,
            });
        }
        if result.confirmations > self.max_confirmations {
            return Err(FailureReason::AboveMaxConfirmations {
                confirmations: result.confirmations,
                allowed: self.max_confirmations,
            });
        }
        let received = AtomicAmount(result.amount_received);
        if received < self.min_amount {
            return Err(FailureReason::BelowMinAmount {
                received,
                required: self.min_amount,
            });
        }
        Ok(())
    }
}

/// Evaluate the `Authorization` header value of one request.
///
/// A missing or empty header is rejected without a reason. Verifier faults
/// become [`FailureReason::Unverifiable`].
pub async fn evaluate(
    authorization: Option<&str>,
    policy: &Policy,
    verifier: &SharedVerifier,
) -> Decision {
    let decision = decide(authorization, policy, verifier).await;
    metrics::record_decision(&decision);
    decision
}

async fn decide(authorization: Option<&str>, policy: &Policy, verifier: &SharedVerifier) -> Decision {
    let Some(value) = authorization.filter(|v| !v.is_empty()) else {
        tracing::debug!("No credential presented");
        return Decision::Rejected(None);
    };

    let credential = match auth::decode(value, policy.scheme()) {
        Ok(credential) => credential,
        Err(err) => {
            let reason = FailureReason::from_decode(err, policy.scheme());
            tracing::info!(reason = reason.code(), "Credential rejected");
            return Decision::Rejected(Some(reason));
        }
    };

    let result = match verifier.verify_payment(&credential).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(tx = %credential.tx_reference, error = %err, "Payment verification failed");
            return Decision::Rejected(Some(FailureReason::Unverifiable(err.to_string())));
        }
    };

    match policy.check(&result) {
        Ok(()) => {
            tracing::info!(
                tx = %credential.tx_reference,
                amount = %AtomicAmount(result.amount_received),
                confirmations = result.confirmations,
                "Payment accepted"
            );
            Decision::Accepted(Payment {
                tx_reference: credential.tx_reference,
                amount: AtomicAmount(result.amount_received),
                confirmations: result.confirmations,
            })
        }
        Err(reason) => {
            tracing::info!(
                tx = %credential.tx_reference,
                amount = %AtomicAmount(result.amount_received),
                confirmations = result.confirmations,
                in_pool = result.in_mempool,
                reason = reason.code(),
                "Payment rejected"
            );
            Decision::Rejected(Some(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TxReference;
    use crate::blockchain::{BlockchainError, BlockchainResult, PaymentVerifier};
    use async_trait::async_trait;
    use base64::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TXID: &str = "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12";

    struct Fixed {
        result: Option<VerificationResult>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PaymentVerifier for Fixed {
        async fn refresh(&mut self) -> BlockchainResult<()> {
            Ok(())
        }

        async fn verify_proof(
            &mut self,
            _tx: &TxReference,
            _address: &str,
            _signature: &str,
        ) -> BlockchainResult<VerificationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .ok_or_else(|| BlockchainError::Rpc("daemon unreachable".into()))
        }

        async fn current_height(&mut self) -> BlockchainResult<u64> {
            Ok(1)
        }

        async fn address(&mut self) -> BlockchainResult<String> {
            Ok("5addr".into())
        }
    }

    async fn verifier(result: Option<VerificationResult>) -> (SharedVerifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fixed = Fixed {
            result,
            calls: calls.clone(),
        };
        (SharedVerifier::new(fixed, Duration::from_secs(5)).await.unwrap(), calls)
    }

    fn policy(scheme: AuthScheme) -> Policy {
        // 1 XMR = 10^12 piconero
        Policy::new(scheme, "1", 3, 150).unwrap()
    }

    fn good() -> VerificationResult {
        VerificationResult {
            amount_received: 2_000_000_000_000,
            confirmations: 5,
            in_mempool: false,
            proof_valid: true,
        }
    }

    fn bearer() -> String {
        format!("Bearer {}:sigXYZ", TXID)
    }

    #[test]
    fn test_policy_validation() {
        assert!(matches!(
            Policy::new(AuthScheme::Bearer, "x", 1, 2),
            Err(PolicyError::Amount(_))
        ));
        assert_eq!(
            Policy::new(AuthScheme::Bearer, "1", 5, 2),
            Err(PolicyError::InvertedWindow { min: 5, max: 2 })
        );
        let policy = Policy::new(AuthScheme::Basic, " 0.01 ", 0, 0).unwrap();
        assert_eq!(policy.min_amount_text(), "0.01");
        assert_eq!(policy.min_amount, AtomicAmount(10_000_000_000));
    }

    #[test]
    fn test_check_order_first_failure_wins() {
        let policy = policy(AuthScheme::Bearer);
        let all_bad = VerificationResult {
            amount_received: 0,
            confirmations: 0,
            in_mempool: true,
            proof_valid: false,
        };
        assert_eq!(policy.check(&all_bad), Err(FailureReason::ProofInvalid));

        let r = VerificationResult { proof_valid: true, ..all_bad };
        assert_eq!(policy.check(&r), Err(FailureReason::InMempool));

        let r = VerificationResult { in_mempool: false, ..r };
        assert!(matches!(policy.check(&r), Err(FailureReason::BelowMinConfirmations { .. })));

        let r = VerificationResult { confirmations: 151, ..r };
        assert!(matches!(policy.check(&r), Err(FailureReason::AboveMaxConfirmations { .. })));

        let r = VerificationResult { confirmations: 150, ..r };
        assert!(matches!(policy.check(&r), Err(FailureReason::BelowMinAmount { .. })));

        let r = VerificationResult { amount_received: 1_000_000_000_000, ..r };
        assert_eq!(policy.check(&r), Ok(()));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let policy = policy(AuthScheme::Bearer);
        for confirmations in [3, 150] {
            let r = VerificationResult { confirmations, ..good() };
            assert_eq!(policy.check(&r), Ok(()));
        }
    }

    #[tokio::test]
    async fn test_accepts_good_payment() {
        let (verifier, calls) = verifier(Some(good())).await;
        let header = bearer();
        let decision = evaluate(Some(&header), &policy(AuthScheme::Bearer), &verifier).await;
        match decision {
            Decision::Accepted(payment) => {
                assert_eq!(payment.tx_reference.to_string(), TXID);
                assert_eq!(payment.confirmations, 5);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_low_confirmations_rejected() {
        let (verifier, _) = verifier(Some(VerificationResult { confirmations: 1, ..good() })).await;
        let header = bearer();
        let decision = evaluate(Some(&header), &policy(AuthScheme::Bearer), &verifier).await;
        assert!(matches!(
            decision.failure_reason(),
            Some(FailureReason::BelowMinConfirmations { confirmations: 1, required: 3 })
        ));
    }

    #[tokio::test]
    async fn test_decode_failures_skip_verifier() {
        let (verifier, calls) = verifier(Some(good())).await;
        let policy = policy(AuthScheme::Basic);

        let header = format!("Basic {}", BASE64_STANDARD.encode("short"));
        let decision = evaluate(Some(&header), &policy, &verifier).await;
        assert_eq!(decision, Decision::Rejected(Some(FailureReason::MalformedToken)));

        let header = bearer();
        let decision = evaluate(Some(&header), &policy, &verifier).await;
        assert_eq!(
            decision,
            Decision::Rejected(Some(FailureReason::WrongScheme { expected: AuthScheme::Basic }))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_header_has_no_reason() {
        let (verifier, _) = verifier(Some(good())).await;
        let policy = policy(AuthScheme::Bearer);
        assert_eq!(evaluate(None, &policy, &verifier).await, Decision::Rejected(None));
        assert_eq!(evaluate(Some(""), &policy, &verifier).await, Decision::Rejected(None));
    }

    #[tokio::test]
    async fn test_verifier_fault_becomes_rejection() {
        let (verifier, _) = verifier(None).await;
        let header = bearer();
        let decision = evaluate(Some(&header), &policy(AuthScheme::Bearer), &verifier).await;
        match decision.failure_reason() {
            Some(FailureReason::Unverifiable(msg)) => assert!(msg.contains("daemon unreachable")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
