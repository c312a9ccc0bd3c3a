//! Atomic XMR amounts.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Piconero in one XMR.
pub const PICONERO_PER_XMR: u64 = 1_000_000_000_000;

/// Decimal places of the atomic unit.
const XMR_DECIMALS: u32 = 12;

/// An amount in piconero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AtomicAmount(pub u64);

/// Errors from parsing a decimal XMR amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a decimal number")]
    NotANumber(String),

    #[error("'{0}' is negative")]
    Negative(String),

    #[error("'{0}' has more than 12 decimal places")]
    TooPrecise(String),

    #[error("'{0}' does not fit in 64-bit piconero")]
    Overflow(String),
}

impl FromStr for AtomicAmount {
    type Err = AmountError;

    /// Parse a decimal XMR string such as `"0.01"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let xmr = Decimal::from_str(text).map_err(|_| AmountError::NotANumber(text.to_string()))?;
        if xmr.is_sign_negative() && !xmr.is_zero() {
            return Err(AmountError::Negative(text.to_string()));
        }

        let atomic = xmr
            .checked_mul(Decimal::from(PICONERO_PER_XMR))
            .ok_or_else(|| AmountError::Overflow(text.to_string()))?;
        if !atomic.fract().is_zero() {
            return Err(AmountError::TooPrecise(text.to_string()));
        }
        atomic
            .to_u64()
            .map(AtomicAmount)
            .ok_or_else(|| AmountError::Overflow(text.to_string()))
    }
}

impl fmt::Display for AtomicAmount {
    /// Formats as decimal XMR without trailing zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xmr = Decimal::from_i128_with_scale(i128::from(self.0), XMR_DECIMALS).normalize();
        write!(f, "{}", xmr)
    }
}
