// Fixed-point kernel shared by every liquidity shape.
//
// All helpers mirror the on-chain integer semantics exactly: which operand
// rounds, when a result counts as overflow, and the two's-complement
// behaviour of the signed log routine. Nothing here allocates.

use primitive_types::{U256, U512};

use crate::error::{LdfError, Result};

/// 2^96
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);
/// 1e18
pub const WAD: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);
pub const WAD_I128: i128 = 1_000_000_000_000_000_000;
/// Alpha fields are stored as `alpha * 1e8`.
pub const ALPHA_BASE: U256 = U256([100_000_000, 0, 0, 0]);

// ------------------------------ Basic helpers ------------------------------

#[inline]
pub fn dist(a: U256, b: U256) -> U256 {
    if a > b { a - b } else { b - a }
}

/// Checked arithmetic; reverts the way the EVM's checked ops do.
#[inline]
pub fn try_add(a: U256, b: U256) -> Result<U256> {
    a.checked_add(b).ok_or(LdfError::Overflow)
}

#[inline]
pub fn try_sub(a: U256, b: U256) -> Result<U256> {
    a.checked_sub(b).ok_or(LdfError::Overflow)
}

#[inline]
pub fn try_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(LdfError::Overflow)
}

/// ceil(x / d)
#[inline]
pub fn div_up(x: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(LdfError::DivisionByZero);
    }
    let (q, r) = x.div_mod(d);
    Ok(if r.is_zero() { q } else { q + U256::one() })
}

/// floor(x * y / d) with a 256-bit product.
#[inline]
pub fn mul_div(x: U256, y: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(LdfError::MulDivFailed);
    }
    let product = x.checked_mul(y).ok_or(LdfError::MulDivFailed)?;
    Ok(product / d)
}

/// ceil(x * y / d) with a 256-bit product.
#[inline]
pub fn mul_div_up(x: U256, y: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(LdfError::MulDivFailed);
    }
    let product = x.checked_mul(y).ok_or(LdfError::MulDivFailed)?;
    let (q, r) = product.div_mod(d);
    Ok(if r.is_zero() { q } else { q + U256::one() })
}

// ---------------------------- 512-bit mulDiv -------------------------------

/// floor(a * b / d) with a 512-bit intermediate.
pub fn full_mul_div(a: U256, b: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(LdfError::FullMulDivFailed);
    }
    let quotient = a.full_mul(b) / U512::from(d);
    U256::try_from(quotient).map_err(|_| LdfError::FullMulDivFailed)
}

/// ceil(a * b / d) with a 512-bit intermediate.
pub fn full_mul_div_up(a: U256, b: U256, d: U256) -> Result<U256> {
    if d.is_zero() {
        return Err(LdfError::FullMulDivFailed);
    }
    let (quotient, remainder) = a.full_mul(b).div_mod(U512::from(d));
    let quotient = U256::try_from(quotient).map_err(|_| LdfError::FullMulDivFailed)?;
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or(LdfError::FullMulDivFailed)
    }
}

/// floor(a * b / 2^96)
pub fn full_mul_x96(a: U256, b: U256) -> Result<U256> {
    U256::try_from(a.full_mul(b) >> 96).map_err(|_| LdfError::FullMulDivFailed)
}

/// ceil(a * b / 2^96)
pub fn full_mul_x96_up(a: U256, b: U256) -> Result<U256> {
    let product = a.full_mul(b);
    let low_bits_set = !(product & U512::from(Q96 - U256::one())).is_zero();
    let quotient = U256::try_from(product >> 96).map_err(|_| LdfError::FullMulDivFailed)?;
    if low_bits_set {
        quotient
            .checked_add(U256::one())
            .ok_or(LdfError::FullMulDivFailed)
    } else {
        Ok(quotient)
    }
}

// ------------------------------- WAD helpers -------------------------------

pub fn mul_wad(x: U256, y: U256) -> Result<U256> {
    let product = x.checked_mul(y).ok_or(LdfError::MulWadFailed)?;
    Ok(product / WAD)
}

pub fn mul_wad_up(x: U256, y: U256) -> Result<U256> {
    let product = x.checked_mul(y).ok_or(LdfError::MulWadFailed)?;
    let (q, r) = product.div_mod(WAD);
    Ok(if r.is_zero() { q } else { q + U256::one() })
}

/// trunc(x * WAD / y) on signed WAD values.
pub fn sdiv_wad(x: i128, y: i128) -> Result<i128> {
    if y == 0 {
        return Err(LdfError::SDivWadFailed);
    }
    // |x| * WAD fits in 256 bits for any i128, so the division is exact
    // before the sign is reapplied.
    let magnitude = U256::from(x.unsigned_abs()) * WAD / U256::from(y.unsigned_abs());
    if magnitude > U256::from(i128::MAX as u128) {
        return Err(LdfError::SDivWadFailed);
    }
    let magnitude = magnitude.as_u128() as i128;
    Ok(if (x < 0) != (y < 0) { -magnitude } else { magnitude })
}

// ---------------------------------- rpow -----------------------------------

/// (x / b)^n * b, rounding half up at every step.
///
/// Callers keep `x <= b` (using the reciprocal `b^2 / x` otherwise) so that
/// intermediate squares stay below 2^256.
pub fn rpow(x: U256, n: u32, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(LdfError::RpowOverflow);
    }
    if x.is_zero() {
        return Ok(if n == 0 { b } else { U256::zero() });
    }

    let half = b >> 1;
    let mut x = x;
    let mut z = if n & 1 == 1 { x } else { b };
    let mut y = n >> 1;

    while y > 0 {
        if !(x >> 128).is_zero() {
            return Err(LdfError::RpowOverflow);
        }
        let xx = x * x;
        let xx_round = xx.checked_add(half).ok_or(LdfError::RpowOverflow)?;
        x = xx_round / b;

        if y & 1 == 1 {
            let zx = z.checked_mul(x).ok_or(LdfError::RpowOverflow)?;
            let zx_round = zx.checked_add(half).ok_or(LdfError::RpowOverflow)?;
            z = zx_round / b;
        }
        y >>= 1;
    }

    Ok(z)
}

// ------------------------------- Natural log -------------------------------

// Two's-complement words, evaluated the way the EVM does.
mod word {
    use primitive_types::U256;

    #[inline]
    pub fn add(a: U256, b: U256) -> U256 {
        a.overflowing_add(b).0
    }

    #[inline]
    pub fn sub(a: U256, b: U256) -> U256 {
        a.overflowing_sub(b).0
    }

    #[inline]
    pub fn mul(a: U256, b: U256) -> U256 {
        a.overflowing_mul(b).0
    }

    #[inline]
    pub fn is_negative(v: U256) -> bool {
        v.bit(255)
    }

    #[inline]
    pub fn neg(v: U256) -> U256 {
        add(!v, U256::one())
    }

    #[inline]
    pub fn abs(v: U256) -> U256 {
        if is_negative(v) { neg(v) } else { v }
    }

    #[inline]
    pub fn sar(v: U256, shift: usize) -> U256 {
        if is_negative(v) { !((!v) >> shift) } else { v >> shift }
    }

    #[inline]
    pub fn sdiv(a: U256, b: U256) -> U256 {
        let quotient = abs(a) / abs(b);
        if is_negative(a) != is_negative(b) { neg(quotient) } else { quotient }
    }
}

/// ln(x / 2^96) in WAD.
///
/// `x` is read as a signed 256-bit word; zero and negative inputs fail.
pub fn ln_q96(x: U256) -> Result<i128> {
    if x.is_zero() || word::is_negative(x) {
        return Err(LdfError::LnUndefined);
    }

    // r = 255 - log2(x); k = log2(x) - 96 = 159 - r
    let r = x.leading_zeros() as usize;
    // Reduce x into [1, 2) * 2^96.
    let x = (x << r) >> 159;

    let mut p = word::add(U256::from(3273285459638523848632254066296u128), x);
    p = word::add(
        U256::from(24828157081833163892658089445524u128),
        word::sar(word::mul(p, x), 96),
    );
    p = word::add(
        U256::from(43456485725739037958740375743393u128),
        word::sar(word::mul(p, x), 96),
    );
    p = word::sub(
        word::sar(word::mul(p, x), 96),
        U256::from(11111509109440967052023855526967u128),
    );
    p = word::sub(
        word::sar(word::mul(p, x), 96),
        U256::from(45023709667254063763336534515857u128),
    );
    p = word::sub(
        word::sar(word::mul(p, x), 96),
        U256::from(14706773417378608786704636184526u128),
    );
    p = word::sub(word::mul(p, x), U256::from(795164235651350426258249787498u128) << 96);

    let mut q = word::add(U256::from(5573035233440673466300451813936u128), x);
    for c in [
        71694874799317883764090561454958u128,
        283447036172924575727196451306956u128,
        401686690394027663651624208769553u128,
        204048457590392012362485061816622u128,
        31853899698501571402653359427138u128,
        909429971244387300277376558375u128,
    ] {
        q = word::add(U256::from(c), word::sar(word::mul(x, q), 96));
    }

    p = word::sdiv(p, q);
    // scale factor s * 5^18 * 2^96
    p = word::mul(U256([0x5cef59f0815a5506, 0xdaa0d5f769dba191, 0x1340, 0x0]), p);
    // ln(2) * k * 5^18 * 2^192
    let k = word::sub(U256::from(159u64), U256::from(r as u64));
    p = word::add(
        word::mul(
            U256([0xd803ae7b6687f2b3, 0x7614a3f75373f047, 0xb3975ab3ee5b203a, 0x267a36c0c95]),
            k,
        ),
        p,
    );

    let result = word::sar(p, 174);
    let magnitude = word::abs(result).low_u128();
    let magnitude = i128::try_from(magnitude).map_err(|_| LdfError::Overflow)?;
    Ok(if word::is_negative(result) { -magnitude } else { magnitude })
}

/// `ln_q96` nudged up by one wei so callers never underestimate the log.
pub fn ln_q96_rounding_up(x: U256) -> Result<i128> {
    let r = ln_q96(x)?;
    if x == Q96 { Ok(r) } else { Ok(r + 1) }
}

/// Converts a WAD-scaled tick offset into a rounded tick `x * ts + mu`.
pub fn x_wad_to_rounded_tick(x_wad: i128, mu: i32, tick_spacing: i32, round_up: bool) -> Result<i32> {
    let mut x = x_wad / WAD_I128;
    let has_remainder = x_wad % WAD_I128 != 0;
    if round_up {
        if x_wad > 0 && has_remainder {
            x += 1;
        }
    } else if x_wad < 0 && has_remainder {
        x -= 1;
    }

    // int24 cast
    if !(-(1 << 23)..(1 << 23)).contains(&x) {
        return Err(LdfError::Overflow);
    }
    let tick = x as i64 * tick_spacing as i64 + mu as i64;
    i32::try_from(tick).map_err(|_| LdfError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max() -> U256 {
        U256::MAX
    }

    #[test]
    fn test_constants() {
        assert_eq!(Q96, U256::one() << 96);
        assert_eq!(WAD, U256::exp10(18));
        assert_eq!(ALPHA_BASE, U256::exp10(8));
    }

    #[test]
    fn test_full_mul_div_handles_512_bit_intermediate() {
        let a = max();
        let r = full_mul_div(a, a, a).unwrap();
        assert_eq!(r, a);

        let r = full_mul_div(Q96 << 100, Q96 << 100, Q96 << 100).unwrap();
        assert_eq!(r, Q96 << 100);
    }

    #[test]
    fn test_full_mul_div_errors() {
        assert_eq!(full_mul_div(U256::one(), U256::one(), U256::zero()), Err(LdfError::FullMulDivFailed));
        assert_eq!(full_mul_div(max(), max(), U256::one()), Err(LdfError::FullMulDivFailed));
        assert_eq!(full_mul_div_up(max(), max(), max() - 1), Err(LdfError::FullMulDivFailed));
    }

    #[test]
    fn test_full_mul_div_up_rounds() {
        assert_eq!(full_mul_div_up(U256::from(7), U256::from(3), U256::from(2)).unwrap(), U256::from(11));
        assert_eq!(full_mul_div(U256::from(7), U256::from(3), U256::from(2)).unwrap(), U256::from(10));
        assert_eq!(full_mul_div_up(U256::from(8), U256::from(3), U256::from(2)).unwrap(), U256::from(12));
    }

    #[test]
    fn test_full_mul_x96() {
        assert_eq!(full_mul_x96(Q96, U256::from(5)).unwrap(), U256::from(5));
        assert_eq!(full_mul_x96(U256::from(3), U256::from(5)).unwrap(), U256::zero());
        assert_eq!(full_mul_x96_up(U256::from(3), U256::from(5)).unwrap(), U256::one());
        assert_eq!(full_mul_x96_up(Q96, U256::from(5)).unwrap(), U256::from(5));
        assert_eq!(full_mul_x96(max(), max()), Err(LdfError::FullMulDivFailed));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(max(), U256::from(2), U256::from(4)), Err(LdfError::MulDivFailed));
        assert_eq!(mul_div_up(U256::from(5), U256::from(3), U256::from(4)).unwrap(), U256::from(4));
        assert_eq!(div_up(U256::from(10), U256::from(3)).unwrap(), U256::from(4));
        assert_eq!(div_up(U256::from(9), U256::from(3)).unwrap(), U256::from(3));
        assert_eq!(div_up(U256::one(), U256::zero()), Err(LdfError::DivisionByZero));
    }

    #[test]
    fn test_rpow() {
        assert_eq!(rpow(U256::zero(), 0, Q96).unwrap(), Q96);
        assert_eq!(rpow(U256::zero(), 3, Q96).unwrap(), U256::zero());
        assert_eq!(rpow(Q96, 1000, Q96).unwrap(), Q96);
        assert_eq!(rpow(Q96 * 2, 10, Q96).unwrap(), Q96 * 1024);
        assert_eq!(rpow(Q96 / 2, 3, Q96).unwrap(), Q96 / 8);
        assert_eq!(rpow(U256::from(2), 8, U256::one()).unwrap(), U256::from(256));
    }

    #[test]
    fn test_rpow_overflow() {
        assert_eq!(rpow(U256::one() << 129, 2, Q96), Err(LdfError::RpowOverflow));
        assert_eq!(rpow(Q96 * 2, 200, Q96), Err(LdfError::RpowOverflow));
    }

    #[test]
    fn test_mul_wad() {
        assert_eq!(mul_wad(WAD * 3, WAD / 2).unwrap(), WAD * 3 / 2);
        assert_eq!(mul_wad(U256::from(1), U256::from(1)).unwrap(), U256::zero());
        assert_eq!(mul_wad_up(U256::from(1), U256::from(1)).unwrap(), U256::one());
        assert_eq!(mul_wad(max(), U256::from(2)), Err(LdfError::MulWadFailed));
    }

    #[test]
    fn test_ln_q96_reference_values() {
        assert_eq!(ln_q96(Q96).unwrap(), 0);
        assert_eq!(ln_q96(Q96 * 2).unwrap(), 693_147_180_559_945_309);
        assert_eq!(ln_q96(Q96 / 2).unwrap(), -693_147_180_559_945_310);
        assert_eq!(ln_q96(Q96 * 3).unwrap(), 1_098_612_288_668_109_691);
        assert_eq!(ln_q96(U256::one()).unwrap(), -66_542_129_333_754_749_705);
    }

    #[test]
    fn test_ln_q96_undefined() {
        assert_eq!(ln_q96(U256::zero()), Err(LdfError::LnUndefined));
        assert_eq!(ln_q96(U256::one() << 255), Err(LdfError::LnUndefined));
    }

    #[test]
    fn test_ln_q96_rounding_up() {
        assert_eq!(ln_q96_rounding_up(Q96).unwrap(), 0);
        assert_eq!(ln_q96_rounding_up(Q96 * 2).unwrap(), 693_147_180_559_945_310);
    }

    #[test]
    fn test_sdiv_wad() {
        assert_eq!(sdiv_wad(3 * WAD_I128, 2 * WAD_I128).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(sdiv_wad(-3, 2).unwrap(), -1_500_000_000_000_000_000);
        assert_eq!(sdiv_wad(1, 3 * WAD_I128).unwrap(), 0);
        assert_eq!(sdiv_wad(1, 0), Err(LdfError::SDivWadFailed));
    }

    #[test]
    fn test_x_wad_to_rounded_tick() {
        assert_eq!(x_wad_to_rounded_tick(2 * WAD_I128 + 1, 100, 10, true).unwrap(), 130);
        assert_eq!(x_wad_to_rounded_tick(2 * WAD_I128 + 1, 100, 10, false).unwrap(), 120);
        assert_eq!(x_wad_to_rounded_tick(-WAD_I128 - 1, 0, 10, false).unwrap(), -20);
        assert_eq!(x_wad_to_rounded_tick(-WAD_I128 - 1, 0, 10, true).unwrap(), -10);
        assert_eq!(x_wad_to_rounded_tick(3 * WAD_I128, -60, 60, true).unwrap(), 120);
        assert!(x_wad_to_rounded_tick(i128::MAX, 0, 1, false).is_err());
    }
}
