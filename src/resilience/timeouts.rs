//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream connect and exchange with a deadline
//! - Keep timeout errors distinct from other I/O errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// An operation exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} timed out after {after:?}")]
pub struct Elapsed {
    pub operation: &'static str,
    pub after: Duration,
}

/// Run `future` with a deadline.
pub async fn deadline<F, T>(operation: &'static str, after: Duration, future: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| Elapsed { operation, after })
}
