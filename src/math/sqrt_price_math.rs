use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::math::fixed_point::{div_up, full_mul_div, full_mul_div_up, Q96};

/// 2^160 - 1
const U160_MAX: U256 = U256([u64::MAX, u64::MAX, u32::MAX as u64, 0]);

#[inline]
fn sort2(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

#[inline]
fn to_u160(v: U256) -> Result<U256> {
    if v > U160_MAX { Err(LdfError::PriceOverflow) } else { Ok(v) }
}

// --------------------------- SqrtPriceMath deltas ---------------------------

/// amount0 between two sqrt prices:
///   round_up:  ceil( ceil( (L << 96) * (sb - sa) / sb ) / sa )
///   otherwise: floor( floor( (L << 96) * (sb - sa) / sb ) / sa )
pub fn get_amount0_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (sa, sb) = sort2(sqrt_price_a_x96, sqrt_price_b_x96);
    if sa.is_zero() {
        return Err(LdfError::InvalidPriceOrLiquidity);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sb - sa;

    if round_up {
        div_up(full_mul_div_up(numerator1, numerator2, sb)?, sa)
    } else {
        Ok(full_mul_div(numerator1, numerator2, sb)? / sa)
    }
}

/// amount1 between two sqrt prices: L * (sb - sa) / Q96, rounded as asked.
pub fn get_amount1_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (sa, sb) = sort2(sqrt_price_a_x96, sqrt_price_b_x96);
    let diff = sb - sa;
    if round_up {
        full_mul_div_up(U256::from(liquidity), diff, Q96)
    } else {
        full_mul_div(U256::from(liquidity), diff, Q96)
    }
}

// ----------------------------- Next price helpers ----------------------------

/// Price after adding or removing `amount` of token0 at constant liquidity.
///
/// Always rounds up so the price moves at least far enough for an exact
/// output and not too far for an exact input.
pub fn get_next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    if amount.is_zero() {
        return Ok(sqrt_price_x96);
    }
    let numerator1 = U256::from(liquidity) << 96;

    if add {
        if let Some(product) = amount.checked_mul(sqrt_price_x96) {
            if let Some(denominator) = numerator1.checked_add(product) {
                return full_mul_div_up(numerator1, sqrt_price_x96, denominator);
            }
        }
        // liquidity / (liquidity / sqrtP + amount)
        let fallback = (numerator1 / sqrt_price_x96)
            .checked_add(amount)
            .ok_or(LdfError::PriceOverflow)?;
        div_up(numerator1, fallback)
    } else {
        let product = amount.checked_mul(sqrt_price_x96).ok_or(LdfError::PriceOverflow)?;
        if numerator1 <= product {
            return Err(LdfError::PriceOverflow);
        }
        let denominator = numerator1 - product;
        to_u160(full_mul_div_up(numerator1, sqrt_price_x96, denominator)?)
    }
}

/// Price after adding or removing `amount` of token1 at constant liquidity.
///
/// Always rounds down.
pub fn get_next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    if liquidity == 0 {
        return Err(LdfError::InvalidPriceOrLiquidity);
    }
    let liquidity = U256::from(liquidity);

    if add {
        let quotient = if amount <= U160_MAX {
            (amount << 96) / liquidity
        } else {
            full_mul_div(amount, Q96, liquidity)?
        };
        let next = sqrt_price_x96.checked_add(quotient).ok_or(LdfError::PriceOverflow)?;
        to_u160(next)
    } else {
        let quotient = if amount <= U160_MAX {
            div_up(amount << 96, liquidity)?
        } else {
            full_mul_div_up(amount, Q96, liquidity)?
        };
        if sqrt_price_x96 <= quotient {
            return Err(LdfError::InsufficientLiquidity);
        }
        Ok(sqrt_price_x96 - quotient)
    }
}

pub fn get_next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if sqrt_price_x96.is_zero() || liquidity == 0 {
        return Err(LdfError::InvalidPriceOrLiquidity);
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_in, true)
    }
}

pub fn get_next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if sqrt_price_x96.is_zero() || liquidity == 0 {
        return Err(LdfError::InvalidPriceOrLiquidity);
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x96, liquidity, amount_out, false)
    }
}

/// Casts a 256-bit liquidity value into the 128-bit range the delta
/// functions accept.
#[inline]
pub fn to_liquidity(v: U256) -> Result<u128> {
    if v > U256::from(u128::MAX) {
        Err(LdfError::LiquidityOverflow)
    } else {
        Ok(v.low_u128())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::get_sqrt_price_at_tick;

    fn e18() -> U256 {
        U256::exp10(18)
    }

    #[test]
    fn test_amount0_delta_rounding() {
        let sa = Q96;
        let sb = get_sqrt_price_at_tick(60).unwrap();
        let up = get_amount0_delta(sa, sb, 1_000_000_000_000u128, true).unwrap();
        let down = get_amount0_delta(sa, sb, 1_000_000_000_000u128, false).unwrap();
        assert!(up == down || up == down + 1);
        // order does not matter
        assert_eq!(get_amount0_delta(sb, sa, 1_000_000_000_000u128, true).unwrap(), up);
    }

    #[test]
    fn test_amount_deltas_are_zero_on_equal_prices() {
        assert_eq!(get_amount0_delta(Q96, Q96, 1_000u128, true).unwrap(), U256::zero());
        assert_eq!(get_amount1_delta(Q96, Q96, 1_000u128, true).unwrap(), U256::zero());
        assert_eq!(get_amount0_delta(U256::zero(), Q96, 1_000u128, true), Err(LdfError::InvalidPriceOrLiquidity));
    }

    #[test]
    fn test_amount1_delta_known_value() {
        // L = 1e18 between price 1 and price ~1.21 (sqrt 1 -> 1.1)
        let sb = Q96 * 11 / 10;
        let up = get_amount1_delta(Q96, sb, 1_000_000_000_000_000_000u128, true).unwrap();
        let down = get_amount1_delta(Q96, sb, 1_000_000_000_000_000_000u128, false).unwrap();
        assert!(down <= e18() / 10 && up >= e18() / 10 - 1);
        assert!(up - down <= U256::one());
    }

    #[test]
    fn test_next_sqrt_price_from_amount0_inverts_delta() {
        let liquidity = 1_000_000_000_000_000_000u128;
        let upper = get_sqrt_price_at_tick(600).unwrap();
        let lower = get_sqrt_price_at_tick(0).unwrap();
        let amount0 = get_amount0_delta(lower, upper, liquidity, false).unwrap();
        let next = get_next_sqrt_price_from_amount0_rounding_up(upper, liquidity, amount0, true).unwrap();
        assert!(next >= lower);
        assert_eq!(crate::math::tick_math::get_tick_at_sqrt_price(next).unwrap(), 0);
    }

    #[test]
    fn test_next_sqrt_price_from_amount1() {
        let liquidity = 1_000_000_000_000_000_000u128;
        let next = get_next_sqrt_price_from_amount1_rounding_down(Q96, liquidity, e18() / 10, true).unwrap();
        assert_eq!(next, Q96 + Q96 / 10);
        let back = get_next_sqrt_price_from_amount1_rounding_down(next, liquidity, e18() / 10, false).unwrap();
        assert!(back <= Q96);
        assert_eq!(
            get_next_sqrt_price_from_amount1_rounding_down(Q96, liquidity, e18() * 2, false),
            Err(LdfError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_next_sqrt_price_from_input_output_validation() {
        assert_eq!(
            get_next_sqrt_price_from_input(U256::zero(), 1, U256::one(), true),
            Err(LdfError::InvalidPriceOrLiquidity)
        );
        assert_eq!(
            get_next_sqrt_price_from_output(Q96, 0, U256::one(), false),
            Err(LdfError::InvalidPriceOrLiquidity)
        );
        let p = get_next_sqrt_price_from_input(Q96, 1_000_000, U256::from(1000u64), true).unwrap();
        assert!(p < Q96);
        let p = get_next_sqrt_price_from_output(Q96, 1_000_000, U256::from(1000u64), true).unwrap();
        assert!(p < Q96);
    }

    #[test]
    fn test_to_liquidity() {
        assert_eq!(to_liquidity(U256::from(5u64)).unwrap(), 5);
        assert_eq!(to_liquidity(U256::one() << 128), Err(LdfError::LiquidityOverflow));
    }
}
