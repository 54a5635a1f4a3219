use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::ldf::carpeted::MainWindow;
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::{resolve_anchor, ShiftMode};
use crate::ldf::{check_static_window, check_tick_spacing, check_window_width, offset_tick, uniform};
use crate::ldf::{Distribution, LdfKind, LdfShape, Resolved};
use crate::math::fixed_point::{
    dist, full_mul_div, full_mul_div_up, full_mul_x96_up, ln_q96, ln_q96_rounding_up, mul_div, mul_div_up,
    rpow, sdiv_wad, try_add, try_mul, try_sub, x_wad_to_rounded_tick, ALPHA_BASE, Q96, WAD_I128,
};
use crate::math::tick_math::{get_sqrt_price_at_tick, max_usable_tick, min_usable_tick, round_tick_single, MAX_TICK};

// Geometric distribution over `length` rounded ticks starting at `min_tick`:
// the density at offset x is proportional to alpha^x. An alpha of exactly
// one degenerates into the uniform window.

/// Alphas are packed as `alpha * 1e8`.
pub fn alpha_x96(alpha: u32) -> Result<U256> {
    mul_div(U256::from(alpha), Q96, ALPHA_BASE)
}

#[inline]
fn sqrt_price(tick: i32) -> Result<U256> {
    get_sqrt_price_at_tick(tick)
}

#[inline]
fn pow(x: U256, n: i32) -> Result<U256> {
    rpow(x, n as u32, Q96)
}

/// 1 / alpha in Q96.
#[inline]
fn alpha_inv(alpha_x96: U256) -> Result<U256> {
    mul_div(Q96, Q96, alpha_x96)
}

pub fn liquidity_density_x96(
    tick_spacing: i32,
    rounded_tick: i32,
    min_tick: i32,
    length: i32,
    alpha_x96: U256,
) -> Result<U256> {
    let max_tick = min_tick + length * tick_spacing;
    if alpha_x96 == Q96 {
        return Ok(uniform::liquidity_density_x96(tick_spacing, rounded_tick, min_tick, max_tick));
    }
    if rounded_tick < min_tick || rounded_tick >= max_tick {
        return Ok(U256::zero());
    }
    let x = (rounded_tick - min_tick) / tick_spacing;

    if alpha_x96 > Q96 {
        let alpha_inv_x96 = alpha_inv(alpha_x96)?;
        let term = pow(alpha_inv_x96, length - x)?;
        let denominator = try_sub(Q96, pow(alpha_inv_x96, length)?)?;
        full_mul_div(term, alpha_x96 - Q96, denominator)
    } else {
        let denominator = try_sub(Q96, pow(alpha_x96, length)?)?;
        mul_div(Q96 - alpha_x96, pow(alpha_x96, x)?, denominator)
    }
}

/// Token0 held in `[rounded_tick, max_tick)`, rounded up.
pub fn cumulative_amount0(
    tick_spacing: i32,
    rounded_tick: i32,
    total_liquidity: U256,
    min_tick: i32,
    length: i32,
    alpha_x96: U256,
) -> Result<U256> {
    let max_tick = min_tick + length * tick_spacing;
    if alpha_x96 == Q96 {
        return uniform::cumulative_amount0(tick_spacing, rounded_tick, total_liquidity, min_tick, max_tick, false);
    }
    let x = if rounded_tick < min_tick {
        0
    } else if rounded_tick >= max_tick {
        return Ok(U256::zero());
    } else {
        (rounded_tick - min_tick) / tick_spacing
    };

    let sqrt_neg_spacing = sqrt_price(-tick_spacing)?;
    let sqrt_min_tick = sqrt_price(min_tick)?;

    let density = if alpha_x96 > Q96 {
        let alpha_inv_x96 = alpha_inv(alpha_x96)?;
        let remaining = length - x;
        let numerator = dist(pow(alpha_inv_x96, remaining)?, sqrt_price(-tick_spacing * remaining)?);
        let denominator = dist(alpha_inv_x96, sqrt_neg_spacing);
        let term1 = mul_div_up(Q96 - alpha_inv_x96, numerator, denominator)?;
        let term2 = mul_div_up(
            term1,
            sqrt_price(-tick_spacing * x)?,
            try_sub(Q96, pow(alpha_inv_x96, length)?)?,
        )?;
        mul_div_up(term2, Q96 - sqrt_neg_spacing, sqrt_min_tick)?
    } else {
        let base_x96 = mul_div(alpha_x96, sqrt_neg_spacing, Q96)?;
        let alpha_pow_length = pow(alpha_x96, length)?;
        let x_term = full_mul_div_up(pow(alpha_x96, x)?, sqrt_price(-tick_spacing * x)?, Q96)?;
        let length_term = full_mul_div_up(alpha_pow_length, sqrt_price(-tick_spacing * length)?, Q96)?;
        let numerator = try_mul(try_sub(x_term, length_term)?, Q96 - alpha_x96)?;
        let denominator = try_mul(try_sub(Q96, alpha_pow_length)?, try_sub(Q96, base_x96)?)?;
        let scaled = full_mul_div_up(Q96 - sqrt_neg_spacing, numerator, denominator)?;
        full_mul_div_up(scaled, Q96, sqrt_min_tick)?
    };

    full_mul_x96_up(density, total_liquidity)
}

/// Token1 held in `[min_tick, rounded_tick + tick_spacing)`, rounded up.
pub fn cumulative_amount1(
    tick_spacing: i32,
    rounded_tick: i32,
    total_liquidity: U256,
    min_tick: i32,
    length: i32,
    alpha_x96: U256,
) -> Result<U256> {
    let max_tick = min_tick + length * tick_spacing;
    if alpha_x96 == Q96 {
        return uniform::cumulative_amount1(tick_spacing, rounded_tick, total_liquidity, min_tick, max_tick, false);
    }
    let x = if rounded_tick < min_tick {
        return Ok(U256::zero());
    } else if rounded_tick >= max_tick {
        length - 1
    } else {
        (rounded_tick - min_tick) / tick_spacing
    };

    let sqrt_spacing = sqrt_price(tick_spacing)?;
    let base_x96 = mul_div(alpha_x96, sqrt_spacing, Q96)?;

    let density = if alpha_x96 > Q96 {
        let alpha_inv_x96 = alpha_inv(alpha_x96)?;
        let alpha_inv_pow_length = pow(alpha_inv_x96, length)?;
        let alpha_pow_term = full_mul_div_up(
            pow(alpha_inv_x96, length - x - 1)?,
            sqrt_price((x + 1) * tick_spacing)?,
            Q96,
        )?;
        let term1 = mul_div_up(
            Q96,
            try_sub(alpha_pow_term, alpha_inv_pow_length)?,
            try_sub(Q96, alpha_inv_pow_length)?,
        )?;
        let term2 = mul_div_up(term1, alpha_x96 - Q96, try_sub(base_x96, Q96)?)?;
        mul_div_up(term2, sqrt_spacing - Q96, sqrt_price(-min_tick)?)?
    } else {
        let alpha_pow_term = full_mul_div_up(pow(alpha_x96, x + 1)?, sqrt_price(tick_spacing * (x + 1))?, Q96)?;
        let numerator = try_mul(dist(Q96, alpha_pow_term), Q96 - alpha_x96)?;
        let denominator = try_mul(dist(Q96, base_x96), try_sub(Q96, pow(alpha_x96, length)?)?)?;
        let scaled = full_mul_div_up(sqrt_spacing - Q96, numerator, denominator)?;
        mul_div_up(scaled, sqrt_price(min_tick)?, Q96)?
    };

    full_mul_x96_up(density, total_liquidity)
}

/// Rounded tick where `amount0` runs out: `cumulative_amount0(t) >= amount0`
/// with `t` as far right as the closed form resolves.
pub fn inverse_cumulative_amount0(
    tick_spacing: i32,
    amount0: U256,
    total_liquidity: U256,
    min_tick: i32,
    length: i32,
    alpha_x96: U256,
) -> Result<(bool, i32)> {
    let max_tick = min_tick + length * tick_spacing;
    if alpha_x96 == Q96 {
        return Ok(uniform::inverse_cumulative_amount0(
            tick_spacing,
            amount0,
            total_liquidity,
            min_tick,
            max_tick,
            false,
        ));
    }
    if amount0.is_zero() {
        return Ok((true, max_tick));
    }
    if total_liquidity.is_zero() {
        return Ok((false, 0));
    }

    let density = full_mul_div_up(amount0, Q96, total_liquidity)?;
    let sqrt_neg_spacing = sqrt_price(-tick_spacing)?;
    let sqrt_min_tick = sqrt_price(min_tick)?;
    let base_x96 = mul_div(alpha_x96, sqrt_neg_spacing, Q96)?;
    let ln_base = ln_q96(base_x96)?;

    let mut x_wad = if alpha_x96 > Q96 {
        let alpha_inv_x96 = alpha_inv(alpha_x96)?;
        let alpha_inv_pow_length = pow(alpha_inv_x96, length)?;
        let term_is_positive = alpha_inv_x96 > sqrt_neg_spacing;

        let term1 = mul_div_up(density, sqrt_min_tick, Q96 - sqrt_neg_spacing)?;
        let term2 = mul_div_up(term1, try_sub(Q96, alpha_inv_pow_length)?, Q96)?;
        let tmp = mul_div_up(term2, dist(alpha_inv_x96, sqrt_neg_spacing), Q96 - alpha_inv_x96)?;

        let sqrt_neg_span = sqrt_price(-tick_spacing * length)?;
        if !term_is_positive && sqrt_neg_span <= tmp {
            // at or past capacity, the difference below cancels to nothing
            let covered = cumulative_amount0(tick_spacing, min_tick, total_liquidity, min_tick, length, alpha_x96)?;
            return Ok(if amount0 <= covered { (true, min_tick) } else { (false, 0) });
        }
        let tmp = if term_is_positive {
            try_add(tmp, sqrt_neg_span)?
        } else {
            sqrt_neg_span - tmp
        };

        let numerator = ln_q96_rounding_up(tmp)? + length as i128 * ln_q96_rounding_up(alpha_x96)?;
        sdiv_wad(numerator, ln_base)?
    } else {
        let alpha_pow_length = pow(alpha_x96, length)?;
        let base_pow_length = pow(base_x96, length)?;
        let denominator = try_mul(try_sub(Q96, alpha_pow_length)?, try_sub(Q96, base_x96)?)?;
        let term1 = mul_div_up(density, sqrt_min_tick, Q96)?;
        let numerator = full_mul_div_up(term1, denominator, Q96 - sqrt_neg_spacing)?;
        let base_pow_x = try_add(numerator / (Q96 - alpha_x96), base_pow_length)?;
        sdiv_wad(ln_q96_rounding_up(base_pow_x)?, ln_base)?
    };

    if x_wad < 0 {
        let covered = cumulative_amount0(tick_spacing, min_tick, total_liquidity, min_tick, length, alpha_x96)?;
        if amount0 > covered {
            return Ok((false, 0));
        }
        x_wad = 0;
    }

    let rounded_tick = match x_wad_to_rounded_tick(x_wad, min_tick, tick_spacing, false) {
        Ok(tick) => tick,
        Err(_) => return Ok((false, 0)),
    };
    if rounded_tick < min_tick || rounded_tick > max_tick {
        return Ok((false, 0));
    }
    if rounded_tick == max_tick {
        return Ok((true, max_tick - tick_spacing));
    }
    Ok((true, rounded_tick))
}

/// Rounded tick where `amount1` runs out: `cumulative_amount1(t) >= amount1`
/// with `t` as far left as the closed form resolves.
pub fn inverse_cumulative_amount1(
    tick_spacing: i32,
    amount1: U256,
    total_liquidity: U256,
    min_tick: i32,
    length: i32,
    alpha_x96: U256,
) -> Result<(bool, i32)> {
    let max_tick = min_tick + length * tick_spacing;
    if alpha_x96 == Q96 {
        return Ok(uniform::inverse_cumulative_amount1(
            tick_spacing,
            amount1,
            total_liquidity,
            min_tick,
            max_tick,
            false,
        ));
    }
    if amount1.is_zero() {
        return Ok((true, min_tick - tick_spacing));
    }
    if total_liquidity.is_zero() {
        return Ok((false, 0));
    }

    let density = full_mul_div(amount1, Q96, total_liquidity)?;
    let sqrt_spacing = sqrt_price(tick_spacing)?;
    let base_x96 = mul_div(alpha_x96, sqrt_spacing, Q96)?;
    let ln_base = ln_q96_rounding_up(base_x96)?;

    let mut x_wad = if alpha_x96 > Q96 {
        let alpha_inv_x96 = alpha_inv(alpha_x96)?;
        let alpha_inv_pow_length = pow(alpha_inv_x96, length)?;

        let term1 = mul_div(density, sqrt_price(-min_tick)?, sqrt_spacing - Q96)?;
        let term2 = mul_div(term1, try_sub(base_x96, Q96)?, alpha_x96 - Q96)?;
        let numerator = mul_div(term2, try_sub(Q96, alpha_inv_pow_length)?, Q96)?;
        let sum = try_add(numerator, alpha_inv_pow_length)?;
        if sum.is_zero() {
            return Ok((false, 0));
        }

        let numerator = ln_q96(sum)? + length as i128 * ln_q96(alpha_x96)?;
        sdiv_wad(numerator, ln_base)? - WAD_I128
    } else {
        let denominator = try_mul(dist(Q96, base_x96), try_sub(Q96, pow(alpha_x96, length)?)?)?;
        let term1 = full_mul_div(density, Q96, sqrt_price(min_tick)?)?;
        let numerator = full_mul_div(term1, denominator, sqrt_spacing - Q96)?;
        let quotient = numerator / (Q96 - alpha_x96);

        if Q96 > base_x96 && quotient >= Q96 {
            // at or past capacity, base^(x + 1) rounds down to nothing
            let last_tick = max_tick - tick_spacing;
            let covered = cumulative_amount1(tick_spacing, last_tick, total_liquidity, min_tick, length, alpha_x96)?;
            return Ok(if amount1 <= covered { (true, last_tick) } else { (false, 0) });
        }
        let base_pow_x_plus_one = if Q96 > base_x96 {
            Q96 - quotient
        } else {
            try_add(Q96, quotient)?
        };
        sdiv_wad(ln_q96(base_pow_x_plus_one)?, ln_base)? - WAD_I128
    };

    let x_wad_max = (length - 1) as i128 * WAD_I128;
    if x_wad > x_wad_max {
        let last_tick = max_tick - tick_spacing;
        let covered = cumulative_amount1(tick_spacing, last_tick, total_liquidity, min_tick, length, alpha_x96)?;
        if amount1 > covered {
            return Ok((false, 0));
        }
        x_wad = x_wad_max;
    }

    let rounded_tick = match x_wad_to_rounded_tick(x_wad, min_tick, tick_spacing, true) {
        Ok(tick) => tick,
        Err(_) => return Ok((false, 0)),
    };
    if rounded_tick < min_tick - tick_spacing || rounded_tick >= max_tick {
        return Ok((false, 0));
    }
    if rounded_tick == min_tick - tick_spacing {
        return Ok((true, min_tick));
    }
    Ok((true, rounded_tick))
}

/// Resolved geometric window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometric {
    pub tick_spacing: i32,
    pub min_tick: i32,
    pub length: i32,
    pub alpha_x96: U256,
}

impl MainWindow for Geometric {
    fn min_tick(&self) -> i32 {
        self.min_tick
    }

    fn length(&self) -> i32 {
        self.length
    }
}

impl Distribution for Geometric {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn liquidity_density_x96(&self, rounded_tick: i32) -> Result<U256> {
        liquidity_density_x96(self.tick_spacing, rounded_tick, self.min_tick, self.length, self.alpha_x96)
    }

    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        cumulative_amount0(self.tick_spacing, rounded_tick, total_liquidity, self.min_tick, self.length, self.alpha_x96)
    }

    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        cumulative_amount1(self.tick_spacing, rounded_tick, total_liquidity, self.min_tick, self.length, self.alpha_x96)
    }

    fn inverse_cumulative_amount0(&self, amount0: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        inverse_cumulative_amount0(self.tick_spacing, amount0, total_liquidity, self.min_tick, self.length, self.alpha_x96)
    }

    fn inverse_cumulative_amount1(&self, amount1: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        inverse_cumulative_amount1(self.tick_spacing, amount1, total_liquidity, self.min_tick, self.length, self.alpha_x96)
    }
}

/// Checks a window of `length` rounded ticks anchored at `min_tick_or_offset`.
pub(crate) fn check_window(
    tick_spacing: i32,
    shift_mode: ShiftMode,
    min_tick_or_offset: i32,
    length: i32,
) -> Result<()> {
    if length <= 0 {
        return Err(LdfError::InvalidParams("length must be positive"));
    }
    // sqrt price of -length * tick_spacing must exist
    if length as i64 * tick_spacing as i64 > MAX_TICK as i64 {
        return Err(LdfError::InvalidParams("range wider than MAX_TICK"));
    }
    if shift_mode == ShiftMode::Static {
        check_static_window(tick_spacing, min_tick_or_offset, length)
    } else {
        check_window_width(tick_spacing, length)
    }
}

/// Rejects a zero alpha, or one steep enough that the thinnest tick of the
/// window rounds down to no liquidity at all. Expects a checked window.
pub(crate) fn check_alpha(tick_spacing: i32, length: i32, alpha: u32) -> Result<()> {
    if alpha == 0 {
        return Err(LdfError::InvalidParams("alpha must be nonzero"));
    }
    let alpha_x96 = alpha_x96(alpha)?;
    let thinnest = if alpha_x96 > Q96 { 0 } else { (length - 1) * tick_spacing };
    if liquidity_density_x96(tick_spacing, thinnest, 0, length, alpha_x96)?.is_zero() {
        return Err(LdfError::InvalidParams("edge tick density underflows"));
    }
    Ok(())
}

/// Static min tick, or the rounded TWAP plus offset clamped so the whole
/// window stays inside the usable ticks.
pub(crate) fn anchor_min_tick(
    tick_spacing: i32,
    twap_tick: i32,
    min_tick_or_offset: i32,
    length: i32,
    shift_mode: ShiftMode,
) -> i32 {
    if shift_mode == ShiftMode::Static {
        return min_tick_or_offset;
    }
    let min_tick = round_tick_single(offset_tick(twap_tick, min_tick_or_offset), tick_spacing);
    let lowest = min_usable_tick(tick_spacing);
    let highest = max_usable_tick(tick_spacing) - length * tick_spacing;
    if min_tick < lowest {
        lowest
    } else if min_tick > highest {
        highest
    } else {
        min_tick
    }
}

/// Anchor after the shift policy, the state to persist and the surge flag.
pub(crate) fn resolve_min_tick(
    tick_spacing: i32,
    twap_tick: i32,
    min_tick_or_offset: i32,
    length: i32,
    shift_mode: ShiftMode,
    state: &LdfState,
) -> (i32, LdfState, bool) {
    let candidate = anchor_min_tick(tick_spacing, twap_tick, min_tick_or_offset, length, shift_mode);
    let (min_tick, should_surge) = resolve_anchor(candidate, shift_mode, state);
    let new_state = if shift_mode == ShiftMode::Static {
        LdfState::default()
    } else {
        LdfState::with_anchor(min_tick)
    };
    (min_tick, new_state, should_surge)
}

/// `| shiftMode: u8 | minTickOrOffset: i24 | length: i16 | alpha: u32 |`
pub fn encode_params(shift_mode: ShiftMode, min_tick_or_offset: i32, length: i16, alpha: u32) -> LdfParams {
    LdfParams::default()
        .with_shift_mode(shift_mode)
        .with_i24(1, min_tick_or_offset)
        .with_i16(4, length)
        .with_u32(6, alpha)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricDistribution;

impl LdfShape for GeometricDistribution {
    type Output = Geometric;

    const KIND: LdfKind = LdfKind::Geometric;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Geometric>> {
        check_tick_spacing(tick_spacing)?;
        let shift_mode = params.shift_mode()?;
        let min_tick_or_offset = params.i24_at(1);
        let length = params.i16_at(4) as i32;
        let alpha = params.u32_at(6);

        check_window(tick_spacing, shift_mode, min_tick_or_offset, length)?;
        check_alpha(tick_spacing, length, alpha)?;

        let (min_tick, new_state, should_surge) =
            resolve_min_tick(tick_spacing, twap_tick, min_tick_or_offset, length, shift_mode, state);
        Ok(Resolved {
            distribution: Geometric { tick_spacing, min_tick, length, alpha_x96: alpha_x96(alpha)? },
            new_state,
            should_surge,
        })
    }
}
