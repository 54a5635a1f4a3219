use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::{resolve_anchor, ShiftMode};
use crate::ldf::{check_static_window, check_tick_spacing, offset_tick, Distribution, LdfKind, LdfShape, Resolved};
use crate::math::fixed_point::{div_up, full_mul_div, full_mul_x96_up, Q96};
use crate::math::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_amount0_rounding_up,
    get_next_sqrt_price_from_amount1_rounding_down, to_liquidity,
};
use crate::math::tick_math::{
    get_sqrt_price_at_tick, get_tick_at_sqrt_price, max_usable_tick, min_usable_tick, round_tick_single,
};

// Flat distribution over [tick_lower, tick_upper).
//
// The free functions double as the carpet of the carpeted shapes: with
// `is_carpet` the total liquidity is spread per tick directly instead of
// going through a Q96 density.

#[inline]
fn window_length(tick_spacing: i32, tick_lower: i32, tick_upper: i32) -> i32 {
    (tick_upper - tick_lower) / tick_spacing
}

fn per_tick_liquidity(total_liquidity: U256, length: i32, is_carpet: bool) -> Result<u128> {
    let numerator = if is_carpet { total_liquidity } else { Q96 };
    to_liquidity(div_up(numerator, U256::from(length as u64))?)
}

pub fn liquidity_density_x96(tick_spacing: i32, rounded_tick: i32, tick_lower: i32, tick_upper: i32) -> U256 {
    if rounded_tick < tick_lower || rounded_tick >= tick_upper {
        return U256::zero();
    }
    let length = window_length(tick_spacing, tick_lower, tick_upper);
    if length <= 0 {
        return U256::zero();
    }
    Q96 / U256::from(length as u64)
}

/// Token0 held in `[rounded_tick, tick_upper)`.
pub fn cumulative_amount0(
    tick_spacing: i32,
    rounded_tick: i32,
    total_liquidity: U256,
    tick_lower: i32,
    tick_upper: i32,
    is_carpet: bool,
) -> Result<U256> {
    if rounded_tick >= tick_upper || tick_lower >= tick_upper {
        return Ok(U256::zero());
    }
    let length = window_length(tick_spacing, tick_lower, tick_upper);
    if length <= 0 {
        return Ok(U256::zero());
    }
    let rounded_tick = rounded_tick.max(tick_lower);

    let amount0 = get_amount0_delta(
        get_sqrt_price_at_tick(rounded_tick)?,
        get_sqrt_price_at_tick(tick_upper)?,
        per_tick_liquidity(total_liquidity, length, is_carpet)?,
        true,
    )?;
    if is_carpet {
        Ok(amount0)
    } else {
        full_mul_x96_up(total_liquidity, amount0)
    }
}

/// Token1 held in `[tick_lower, rounded_tick + tick_spacing)`.
pub fn cumulative_amount1(
    tick_spacing: i32,
    rounded_tick: i32,
    total_liquidity: U256,
    tick_lower: i32,
    tick_upper: i32,
    is_carpet: bool,
) -> Result<U256> {
    if rounded_tick < tick_lower || tick_lower >= tick_upper {
        return Ok(U256::zero());
    }
    let length = window_length(tick_spacing, tick_lower, tick_upper);
    if length <= 0 {
        return Ok(U256::zero());
    }
    let rounded_tick = rounded_tick.min(tick_upper - tick_spacing);

    let amount1 = get_amount1_delta(
        get_sqrt_price_at_tick(tick_lower)?,
        get_sqrt_price_at_tick(rounded_tick + tick_spacing)?,
        per_tick_liquidity(total_liquidity, length, is_carpet)?,
        true,
    )?;
    if is_carpet {
        Ok(amount1)
    } else {
        full_mul_x96_up(total_liquidity, amount1)
    }
}

fn scaled_amount(amount: U256, total_liquidity: U256, is_carpet: bool) -> Result<U256> {
    if is_carpet {
        Ok(amount)
    } else {
        full_mul_div(amount, Q96, total_liquidity)
    }
}

/// Smallest rounded tick whose `cumulative_amount0` covers `amount0`.
///
/// Arithmetic failures along the way mean the amount is out of reach, so
/// they come back as `(false, 0)` rather than as errors.
pub fn inverse_cumulative_amount0(
    tick_spacing: i32,
    amount0: U256,
    total_liquidity: U256,
    tick_lower: i32,
    tick_upper: i32,
    is_carpet: bool,
) -> (bool, i32) {
    if amount0.is_zero() {
        return (true, tick_upper);
    }
    let length = window_length(tick_spacing, tick_lower, tick_upper);
    if length <= 0 {
        return (false, 0);
    }

    let tick = (|| -> Result<i32> {
        let liquidity = per_tick_liquidity(total_liquidity, length, is_carpet)?;
        let amount = scaled_amount(amount0, total_liquidity, is_carpet)?;
        let sqrt_price = get_next_sqrt_price_from_amount0_rounding_up(
            get_sqrt_price_at_tick(tick_upper)?,
            liquidity,
            amount,
            true,
        )?;
        get_tick_at_sqrt_price(sqrt_price)
    })();
    let tick = match tick {
        Ok(tick) => tick,
        Err(e) => {
            log::trace!("uniform inverse0 out of reach: {}", e);
            return (false, 0);
        }
    };

    let rounded_tick = round_tick_single(tick, tick_spacing);
    if rounded_tick < tick_lower {
        // rounding pushed the price just past the lower edge
        return match cumulative_amount0(tick_spacing, tick_lower, total_liquidity, tick_lower, tick_upper, is_carpet) {
            Ok(covered) if amount0 <= covered => (true, tick_lower),
            _ => (false, 0),
        };
    }
    if rounded_tick > tick_upper {
        return (false, 0);
    }
    // a nonzero amount never maps onto the upper edge
    if rounded_tick == tick_upper {
        return (true, tick_upper - tick_spacing);
    }
    (true, rounded_tick)
}

/// Largest rounded tick whose `cumulative_amount1` covers `amount1`.
pub fn inverse_cumulative_amount1(
    tick_spacing: i32,
    amount1: U256,
    total_liquidity: U256,
    tick_lower: i32,
    tick_upper: i32,
    is_carpet: bool,
) -> (bool, i32) {
    if amount1.is_zero() {
        return (true, tick_lower - tick_spacing);
    }
    let length = window_length(tick_spacing, tick_lower, tick_upper);
    if length <= 0 {
        return (false, 0);
    }

    let tick = (|| -> Result<i32> {
        let liquidity = per_tick_liquidity(total_liquidity, length, is_carpet)?;
        let amount = scaled_amount(amount1, total_liquidity, is_carpet)?;
        let sqrt_price = get_next_sqrt_price_from_amount1_rounding_down(
            get_sqrt_price_at_tick(tick_lower)?,
            liquidity,
            amount,
            true,
        )?;
        get_tick_at_sqrt_price(sqrt_price)
    })();
    let mut tick = match tick {
        Ok(tick) => tick,
        Err(e) => {
            log::trace!("uniform inverse1 out of reach: {}", e);
            return (false, 0);
        }
    };

    if tick == tick_upper {
        tick -= 1;
    }
    let rounded_tick = round_tick_single(tick, tick_spacing);
    if rounded_tick >= tick_upper {
        let last_tick = tick_upper - tick_spacing;
        return match cumulative_amount1(tick_spacing, last_tick, total_liquidity, tick_lower, tick_upper, is_carpet) {
            Ok(covered) if amount1 <= covered => (true, last_tick),
            _ => (false, 0),
        };
    }
    if rounded_tick < tick_lower - tick_spacing {
        return (false, 0);
    }
    if rounded_tick == tick_lower - tick_spacing {
        return (true, tick_lower);
    }
    (true, rounded_tick)
}

/// Resolved uniform window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    pub tick_spacing: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl Distribution for Uniform {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn liquidity_density_x96(&self, rounded_tick: i32) -> Result<U256> {
        Ok(liquidity_density_x96(self.tick_spacing, rounded_tick, self.tick_lower, self.tick_upper))
    }

    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        cumulative_amount0(self.tick_spacing, rounded_tick, total_liquidity, self.tick_lower, self.tick_upper, false)
    }

    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        cumulative_amount1(self.tick_spacing, rounded_tick, total_liquidity, self.tick_lower, self.tick_upper, false)
    }

    fn inverse_cumulative_amount0(&self, amount0: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        Ok(inverse_cumulative_amount0(
            self.tick_spacing,
            amount0,
            total_liquidity,
            self.tick_lower,
            self.tick_upper,
            false,
        ))
    }

    fn inverse_cumulative_amount1(&self, amount1: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        Ok(inverse_cumulative_amount1(
            self.tick_spacing,
            amount1,
            total_liquidity,
            self.tick_lower,
            self.tick_upper,
            false,
        ))
    }

    /// Exact amount deltas against the whole window, no total-liquidity scaling.
    fn query_densities(&self, rounded_tick: i32) -> Result<(U256, U256, U256)> {
        let ts = self.tick_spacing;
        let density = self.liquidity_density_x96(rounded_tick)?;
        let length = window_length(ts, self.tick_lower, self.tick_upper);
        if length <= 0 {
            return Ok((density, U256::zero(), U256::zero()));
        }
        let liquidity = per_tick_liquidity(Q96, length, false)?;
        let sqrt_lower = get_sqrt_price_at_tick(self.tick_lower)?;
        let sqrt_upper = get_sqrt_price_at_tick(self.tick_upper)?;

        let next_tick = rounded_tick.saturating_add(ts);
        let cumulative0 = if next_tick >= self.tick_upper {
            U256::zero()
        } else if next_tick <= self.tick_lower {
            get_amount0_delta(sqrt_lower, sqrt_upper, liquidity, true)?
        } else {
            get_amount0_delta(get_sqrt_price_at_tick(next_tick)?, sqrt_upper, liquidity, true)?
        };

        let cumulative1 = if rounded_tick.saturating_sub(ts) < self.tick_lower {
            U256::zero()
        } else if rounded_tick >= self.tick_upper {
            get_amount1_delta(sqrt_lower, sqrt_upper, liquidity, true)?
        } else {
            get_amount1_delta(sqrt_lower, get_sqrt_price_at_tick(rounded_tick)?, liquidity, true)?
        };

        Ok((density, cumulative0, cumulative1))
    }
}

/// `| shiftMode: u8 | tickLowerOrOffset: i24 | tickUpperOrOffset: i24 |`
pub fn encode_params(shift_mode: ShiftMode, tick_lower_or_offset: i32, tick_upper_or_offset: i32) -> LdfParams {
    LdfParams::default()
        .with_shift_mode(shift_mode)
        .with_i24(1, tick_lower_or_offset)
        .with_i24(4, tick_upper_or_offset)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDistribution;

impl LdfShape for UniformDistribution {
    type Output = Uniform;

    const KIND: LdfKind = LdfKind::Uniform;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Uniform>> {
        check_tick_spacing(tick_spacing)?;
        let shift_mode = params.shift_mode()?;
        let lower_or_offset = params.i24_at(1);
        let upper_or_offset = params.i24_at(4);
        if lower_or_offset >= upper_or_offset {
            return Err(LdfError::InvalidParams("tick lower must be below tick upper"));
        }

        if shift_mode == ShiftMode::Static {
            if upper_or_offset % tick_spacing != 0 {
                return Err(LdfError::InvalidParams("tick upper not aligned to tick spacing"));
            }
            check_static_window(
                tick_spacing,
                lower_or_offset,
                window_length(tick_spacing, lower_or_offset, upper_or_offset),
            )?;
            return Ok(Resolved {
                distribution: Uniform { tick_spacing, tick_lower: lower_or_offset, tick_upper: upper_or_offset },
                new_state: LdfState::default(),
                should_surge: false,
            });
        }

        let tick_lower = round_tick_single(offset_tick(twap_tick, lower_or_offset), tick_spacing);
        let tick_upper = round_tick_single(offset_tick(twap_tick, upper_or_offset), tick_spacing);
        let width = tick_upper - tick_lower;

        // the first observation takes the TWAP window as is
        let (tick_lower, tick_upper) = if state.is_initialized() {
            let (anchor, _) = resolve_anchor(tick_lower, shift_mode, state);
            let tick_lower = anchor.max(min_usable_tick(tick_spacing));
            (tick_lower, (tick_lower + width).min(max_usable_tick(tick_spacing)))
        } else {
            (tick_lower, tick_upper)
        };
        if tick_lower >= tick_upper {
            return Err(LdfError::InvalidParams("window collapsed outside usable ticks"));
        }
        let should_surge = state.is_initialized() && tick_lower != state.last_tick();

        Ok(Resolved {
            distribution: Uniform { tick_spacing, tick_lower, tick_upper },
            new_state: LdfState::with_anchor(tick_lower),
            should_surge,
        })
    }
}
