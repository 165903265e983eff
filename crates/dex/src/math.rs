//! Fixed-point integer helpers shared by the pool and the order book.
//!
//! Everything works on raw `U256` token units; there is no floating point
//! anywhere in the engine.

use crate::types::U256;

/// Rounding direction for integer division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round towards zero.
    Down,
    /// Round away from zero.
    Up,
}

/// Computes `a * b / denominator` with the requested rounding.
///
/// Returns `None` on overflow of the intermediate product or a zero
/// denominator.
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = a.checked_mul(b)?;
    let quotient = product / denominator;
    match rounding {
        Rounding::Down => Some(quotient),
        Rounding::Up => {
            if (product % denominator).is_zero() {
                Some(quotient)
            } else {
                quotient.checked_add(U256::from(1))
            }
        }
    }
}

/// Integer square root (floor) via Newton's method.
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::ZERO;
    }
    let two = U256::from(2);
    let mut x = n;
    let mut y = x / two + x % two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}

/// `10^decimals` as a `U256`.
///
/// Token decimals are read from the ledger as `u8`, so this never overflows.
pub fn pow10(decimals: u8) -> U256 {
    let ten = U256::from(10);
    (0..decimals).fold(U256::from(1), |acc, _| acc * ten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        let seven = U256::from(7);
        let two = U256::from(2);
        let one = U256::from(1);

        assert_eq!(mul_div(seven, one, two, Rounding::Down), Some(U256::from(3)));
        assert_eq!(mul_div(seven, one, two, Rounding::Up), Some(U256::from(4)));
        // Exact division never rounds up
        assert_eq!(mul_div(U256::from(8), one, two, Rounding::Up), Some(U256::from(4)));
        assert_eq!(mul_div(seven, one, U256::ZERO, Rounding::Down), None);
        assert_eq!(mul_div(U256::MAX, two, one, Rounding::Down), None);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(U256::ZERO), U256::ZERO);
        assert_eq!(isqrt(U256::from(1)), U256::from(1));
        assert_eq!(isqrt(U256::from(15)), U256::from(3));
        assert_eq!(isqrt(U256::from(16)), U256::from(4));

        // sqrt(5e18 * 10e18) = sqrt(50) * 1e18
        let product = U256::from(5_000_000_000_000_000_000u128)
            * U256::from(10_000_000_000_000_000_000u128);
        assert_eq!(isqrt(product), U256::from(7_071_067_811_865_475_244u128));
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), U256::from(1));
        assert_eq!(pow10(6), U256::from(1_000_000u64));
        assert_eq!(pow10(18), U256::from(1_000_000_000_000_000_000u128));
    }
}
