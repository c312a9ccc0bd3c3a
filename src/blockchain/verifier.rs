//! Payment verifier capability and its shared, serialized handle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::auth::{Credential, TxReference};
use crate::blockchain::types::{BlockchainResult, VerificationResult};
use crate::observability::metrics;
use crate::resilience::timeouts::deadline;

/// Backend able to prove receipt of a payment.
///
/// Methods take `&mut self`: backends keep chain-sync state that must not be
/// touched concurrently. Share one through [`SharedVerifier`].
#[async_trait]
pub trait PaymentVerifier: Send {
    /// Bring the backend's view of the chain up to date.
    async fn refresh(&mut self) -> BlockchainResult<()>;

    /// Check that `signature` proves transaction `tx` paid `address`.
    async fn verify_proof(
        &mut self,
        tx: &TxReference,
        address: &str,
        signature: &str,
    ) -> BlockchainResult<VerificationResult>;

    /// Current chain height as seen by the backend.
    async fn current_height(&mut self) -> BlockchainResult<u64>;

    /// Receiving address, as text.
    async fn address(&mut self) -> BlockchainResult<String>;
}

/// Process-wide handle to one verifier.
///
/// Every call goes through a single async mutex so refreshes and proof
/// checks from concurrent sessions never interleave.
#[derive(Clone)]
pub struct SharedVerifier {
    inner: Arc<Mutex<dyn PaymentVerifier>>,
    address: Arc<str>,
    deadline: Duration,
}

impl SharedVerifier {
    /// Wrap `verifier`, resolving its receiving address once.
    pub async fn new<V>(mut verifier: V, deadline: Duration) -> BlockchainResult<Self>
    where
        V: PaymentVerifier + 'static,
    {
        let address = verifier.address().await?;
        let inner: Arc<Mutex<dyn PaymentVerifier>> = Arc::new(Mutex::new(verifier));
        Ok(Self {
            inner,
            address: address.into(),
            deadline,
        })
    }

    /// The receiving address advertised in challenges.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Refresh, then verify `credential` against our own address.
    ///
    /// The lock is held across both calls so the proof is checked against
    /// the chain state the refresh produced.
    pub async fn verify_payment(&self, credential: &Credential) -> BlockchainResult<VerificationResult> {
        let start = Instant::now();
        let work = async {
            let mut verifier = self.inner.lock().await;
            verifier.refresh().await?;
            verifier
                .verify_proof(&credential.tx_reference, &self.address, &credential.signature)
                .await
        };
        let result = deadline("payment verification", self.deadline, work).await?;
        metrics::record_verifier_duration(start);
        result
    }

    /// Current chain height, after a refresh.
    pub async fn current_height(&self) -> BlockchainResult<u64> {
        let mut verifier = self.inner.lock().await;
        verifier.refresh().await?;
        verifier.current_height().await
    }
}

impl std::fmt::Debug for SharedVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedVerifier")
            .field("address", &self.address)
            .field("deadline", &self.deadline)
            .finish()
    }
}
