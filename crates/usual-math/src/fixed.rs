//! Fixed-point multiply-divide.
//!
//! WAD-scaled (10^18) products of realistic token supplies overflow `u128`,
//! so the intermediate product is computed in 256 bits and narrowed only
//! after the division. Rounding is explicit at every call site.

use ruint::aliases::U256;

/// Errors from fixed-point arithmetic
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result does not fit in 128 bits")]
    Overflow,
}

/// Rounding mode for `mul_div`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero (the default for every emission stage)
    Floor,
    /// Round away from zero
    Ceil,
}

/// Compute `a * b / denominator` without intermediate overflow.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }

    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(denominator);

    let quotient = match rounding {
        Rounding::Floor => product / denom,
        Rounding::Ceil => {
            let q = product / denom;
            if product % denom == U256::ZERO {
                q
            } else {
                q + U256::from(1u8)
            }
        }
    };

    u128::try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Floor-rounded `a * b / denominator`, the common case.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    mul_div(a, b, denominator, Rounding::Floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_exact_division() {
        assert_eq!(mul_div_floor(10, 10, 4).unwrap(), 25);
        assert_eq!(mul_div(10, 10, 4, Rounding::Ceil).unwrap(), 25);
    }

    #[test]
    fn test_floor_vs_ceil() {
        assert_eq!(mul_div_floor(10, 10, 3).unwrap(), 33);
        assert_eq!(mul_div(10, 10, 3, Rounding::Ceil).unwrap(), 34);
    }

    #[test]
    fn test_wad_product_does_not_overflow() {
        // 1M tokens at 18 decimals times WAD overflows u128; the wide path
        // must still produce the exact quotient.
        let supply = 1_000_000 * WAD;
        assert_eq!(mul_div_floor(supply, WAD, WAD).unwrap(), supply);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_overflow_detected() {
        let result = mul_div_floor(u128::MAX, u128::MAX, 1);
        assert_eq!(result, Err(MathError::Overflow));
    }

    #[test]
    fn test_zero_operands() {
        assert_eq!(mul_div_floor(0, WAD, WAD).unwrap(), 0);
        assert_eq!(mul_div(0, WAD, WAD, Rounding::Ceil).unwrap(), 0);
    }
}
