//! Constant-product reserve pairs.

use crate::config::{FEE_DENOMINATOR, MINIMUM_LIQUIDITY};
use crate::error::{DexError, Result};
use crate::math::{isqrt, mul_div, Rounding};
use crate::types::{Address, Amount, TokenId, B256, U256};
use alloy::primitives::keccak256;
use std::collections::HashMap;

/// Sort two tokens into canonical `(token0, token1)` order.
pub fn sort_tokens(token_a: TokenId, token_b: TokenId) -> Result<(TokenId, TokenId)> {
    if token_a == token_b {
        return Err(DexError::IdenticalTokens);
    }
    if token_a < token_b {
        Ok((token_a, token_b))
    } else {
        Ok((token_b, token_a))
    }
}

/// Salt identifying an unordered token pair.
/// The salt is the same regardless of token order.
pub fn pair_salt(token_a: TokenId, token_b: TokenId) -> Result<B256> {
    let (first, second) = sort_tokens(token_a, token_b)?;

    // Hash the concatenated addresses
    let mut data = [0u8; 40];
    data[..20].copy_from_slice(first.as_slice());
    data[20..].copy_from_slice(second.as_slice());
    Ok(keccak256(data))
}

fn fee_factor(fee_bps: u32) -> Result<U256> {
    FEE_DENOMINATOR
        .checked_sub(fee_bps)
        .map(U256::from)
        .ok_or(DexError::Overflow("fee"))
}

/// Output of an exact-input swap against reserves.
///
/// `floor(x * (10000 - fee) * rOut / (rIn * 10000 + x * (10000 - fee)))`
pub fn get_amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount, fee_bps: u32) -> Result<Amount> {
    if amount_in.is_zero() {
        return Err(DexError::InvalidAmount);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(DexError::InsufficientLiquidity);
    }
    let overflow = || DexError::Overflow("amount out");
    let in_with_fee = amount_in.checked_mul(fee_factor(fee_bps)?).ok_or_else(overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|d| d.checked_add(in_with_fee))
        .ok_or_else(overflow)?;
    mul_div(in_with_fee, reserve_out, denominator, Rounding::Down).ok_or_else(overflow)
}

/// Smallest input whose exact-input swap yields at least `amount_out`.
///
/// `ceil(y * rIn * 10000 / ((rOut - y) * (10000 - fee)))`
pub fn get_amount_in(amount_out: Amount, reserve_in: Amount, reserve_out: Amount, fee_bps: u32) -> Result<Amount> {
    if amount_out.is_zero() {
        return Err(DexError::InvalidAmount);
    }
    if reserve_in.is_zero() || amount_out >= reserve_out {
        return Err(DexError::InsufficientLiquidity);
    }
    let overflow = || DexError::Overflow("amount in");
    let numerator = amount_out
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .ok_or_else(overflow)?;
    let denominator = (reserve_out - amount_out)
        .checked_mul(fee_factor(fee_bps)?)
        .ok_or_else(overflow)?;
    mul_div(numerator, reserve_in, denominator, Rounding::Up).ok_or_else(overflow)
}

/// Amount of B equivalent to `amount_a` of A at the current reserve ratio.
pub fn quote(amount_a: Amount, reserve_a: Amount, reserve_b: Amount) -> Result<Amount> {
    if amount_a.is_zero() {
        return Err(DexError::InvalidAmount);
    }
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(DexError::InsufficientLiquidity);
    }
    mul_div(amount_a, reserve_b, reserve_a, Rounding::Down).ok_or(DexError::Overflow("quote"))
}

/// A two-token constant-product pool.
///
/// Token order is canonical (`token0 < token1`) and fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservePair {
    pub address: Address,
    pub token0: TokenId,
    pub token1: TokenId,
    pub reserve0: Amount,
    pub reserve1: Amount,
    pub total_supply: Amount,
    balances: HashMap<Address, Amount>,
}

impl ReservePair {
    pub fn new(address: Address, token_a: TokenId, token_b: TokenId) -> Result<Self> {
        let (token0, token1) = sort_tokens(token_a, token_b)?;
        Ok(Self {
            address,
            token0,
            token1,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
        })
    }

    pub fn has_liquidity(&self) -> bool {
        !self.reserve0.is_zero() && !self.reserve1.is_zero()
    }

    /// Reserves oriented as `(reserve of token, reserve of the other token)`.
    pub fn reserves_for(&self, token: TokenId) -> Result<(Amount, Amount)> {
        if token == self.token0 {
            Ok((self.reserve0, self.reserve1))
        } else if token == self.token1 {
            Ok((self.reserve1, self.reserve0))
        } else {
            Err(DexError::NotFound(format!("token {token} in pair {}", self.address)))
        }
    }

    pub fn liquidity_of(&self, holder: Address) -> Amount {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    /// Deposit `amount0`/`amount1` (already in custody) and mint shares to `to`.
    pub fn mint(&mut self, to: Address, amount0: Amount, amount1: Amount) -> Result<Amount> {
        let overflow = || DexError::Overflow("mint");
        let liquidity = if self.total_supply.is_zero() {
            let root = isqrt(amount0.checked_mul(amount1).ok_or_else(overflow)?);
            let minimum = U256::from(MINIMUM_LIQUIDITY);
            if root <= minimum {
                return Err(DexError::InsufficientLiquidity);
            }
            self.credit(Address::ZERO, minimum);
            self.total_supply = minimum;
            root - minimum
        } else {
            let by0 = mul_div(amount0, self.total_supply, self.reserve0, Rounding::Down).ok_or_else(overflow)?;
            let by1 = mul_div(amount1, self.total_supply, self.reserve1, Rounding::Down).ok_or_else(overflow)?;
            by0.min(by1)
        };
        if liquidity.is_zero() {
            return Err(DexError::InsufficientLiquidity);
        }

        self.reserve0 = self.reserve0.checked_add(amount0).ok_or_else(overflow)?;
        self.reserve1 = self.reserve1.checked_add(amount1).ok_or_else(overflow)?;
        self.total_supply = self.total_supply.checked_add(liquidity).ok_or_else(overflow)?;
        self.credit(to, liquidity);
        Ok(liquidity)
    }

    /// Burn `liquidity` shares held by `from`, returning the pro-rata reserves.
    pub fn burn(&mut self, from: Address, liquidity: Amount) -> Result<(Amount, Amount)> {
        let held = self.liquidity_of(from);
        if liquidity.is_zero() || held < liquidity {
            return Err(DexError::InsufficientLiquidity);
        }
        let overflow = || DexError::Overflow("burn");
        let amount0 = mul_div(liquidity, self.reserve0, self.total_supply, Rounding::Down).ok_or_else(overflow)?;
        let amount1 = mul_div(liquidity, self.reserve1, self.total_supply, Rounding::Down).ok_or_else(overflow)?;
        if amount0.is_zero() || amount1.is_zero() {
            return Err(DexError::InsufficientLiquidity);
        }

        self.balances.insert(from, held - liquidity);
        self.total_supply -= liquidity;
        self.reserve0 -= amount0;
        self.reserve1 -= amount1;
        Ok((amount0, amount1))
    }

    /// Swap `amount_in` of `token_in` for `amount_out` of the other token.
    ///
    /// Rejects any result whose fee-adjusted product falls below the
    /// current `reserve0 * reserve1`.
    pub fn swap(&mut self, token_in: TokenId, amount_in: Amount, amount_out: Amount, fee_bps: u32) -> Result<()> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in)?;
        if amount_in.is_zero() || amount_out.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        if amount_out >= reserve_out {
            return Err(DexError::InsufficientLiquidity);
        }

        let overflow = || DexError::Overflow("swap");
        let scale = U256::from(FEE_DENOMINATOR);
        let new_in = reserve_in.checked_add(amount_in).ok_or_else(overflow)?;
        let new_out = reserve_out - amount_out;
        let fee = amount_in.checked_mul(U256::from(fee_bps)).ok_or_else(overflow)?;
        let adjusted_in = new_in
            .checked_mul(scale)
            .and_then(|v| v.checked_sub(fee))
            .ok_or_else(overflow)?;
        let adjusted_product = adjusted_in.checked_mul(new_out).ok_or_else(overflow)?;
        let required = reserve_in
            .checked_mul(reserve_out)
            .and_then(|v| v.checked_mul(scale))
            .ok_or_else(overflow)?;
        if adjusted_product < required {
            return Err(DexError::InvariantViolation(format!(
                "k decreased on pair {}",
                self.address
            )));
        }

        if token_in == self.token0 {
            self.reserve0 = new_in;
            self.reserve1 = new_out;
        } else {
            self.reserve1 = new_in;
            self.reserve0 = new_out;
        }
        Ok(())
    }

    /// Add `amount` of `token` to the reserves without paying anything out.
    /// Used for inputs too small to produce a unit of output.
    pub fn donate(&mut self, token: TokenId, amount: Amount) -> Result<()> {
        let reserve = if token == self.token0 {
            &mut self.reserve0
        } else if token == self.token1 {
            &mut self.reserve1
        } else {
            return Err(DexError::NotFound(format!("token {token} in pair {}", self.address)));
        };
        *reserve = reserve.checked_add(amount).ok_or(DexError::Overflow("donate"))?;
        Ok(())
    }

    fn credit(&mut self, holder: Address, amount: Amount) {
        let balance = self.balances.entry(holder).or_default();
        *balance = balance.saturating_add(amount);
    }
}
