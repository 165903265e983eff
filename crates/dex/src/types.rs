//! Core type definitions for the DEX.
//!
//! Re-exports from alloy-primitives for Ethereum-compatible types.

use crate::error::{DexError, Result};
use crate::math::{mul_div, Rounding};

pub use alloy::primitives::{Address, B256, U256};

/// Unique identifier for a token (contract address).
pub type TokenId = Address;

/// Amount of tokens, represented as U256 to handle large token supplies.
/// This is in the smallest unit (e.g., wei for ETH, smallest decimal for ERC-20).
pub type Amount = U256;

/// Host clock reading, in unix seconds.
pub type Timestamp = u64;

/// Price of one whole base token expressed in quote units.
///
/// A price is an integer at the book's price decimals (the quote token's
/// decimals): `quote = base * price / 10^base_decimals`. The `unit`
/// argument of the conversion helpers is that `10^base_decimals`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(pub U256);

impl Price {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Create a price from a u128 for convenience.
    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Quote amount worth `base_amount` at this price.
    pub fn quote_amount(&self, base_amount: Amount, unit: U256, rounding: Rounding) -> Result<Amount> {
        mul_div(base_amount, self.0, unit, rounding).ok_or(DexError::Overflow("quote amount"))
    }

    /// Base amount purchasable with `quote_amount` at this price.
    pub fn base_amount(&self, quote_amount: Amount, unit: U256, rounding: Rounding) -> Result<Amount> {
        if self.is_zero() {
            return Err(DexError::InvalidPrice);
        }
        mul_div(quote_amount, unit, self.0, rounding).ok_or(DexError::Overflow("base amount"))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fail with [`DexError::Expired`] once `now` is past `deadline`.
pub fn ensure_deadline(deadline: Timestamp, now: Timestamp) -> Result<()> {
    if now > deadline {
        return Err(DexError::Expired { deadline, now });
    }
    Ok(())
}
