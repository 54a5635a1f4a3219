//! Liquidity density functions.
//!
//! Every shape is split in two: a [`LdfShape`] that decodes packed params and
//! resolves the anchor against persisted state, and the resulting
//! [`Distribution`] which carries the actual density math. The blanket
//! [`LiquidityDensityFunction`] impl glues the two into the public
//! query/compute-swap surface used by the registry.

pub mod buy_the_dip;
pub mod carpeted;
pub mod carpeted_double_geometric;
pub mod carpeted_geometric;
pub mod double_geometric;
pub mod geometric;
pub mod packed;
pub mod registry;
pub mod shift_mode;
pub mod uniform;

use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::math::fixed_point::Q96;
use crate::math::tick_math::{max_usable_tick, min_usable_tick, MAX_TICK, MIN_TICK};

pub use packed::{LdfParams, LdfState};
pub use registry::{LdfKind, LdfRegistry};
pub use shift_mode::ShiftMode;

/// Densities of one rounded tick, all Q96 scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResult {
    pub liquidity_density_x96: U256,
    pub cumulative_amount0_density_x96: U256,
    pub cumulative_amount1_density_x96: U256,
    pub new_ldf_state: LdfState,
    pub should_surge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapInput {
    pub inverse_cumulative_amount_input: U256,
    pub total_liquidity: U256,
    pub zero_for_one: bool,
    pub exact_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    pub success: bool,
    pub rounded_tick: i32,
    pub cumulative_amount0: U256,
    pub cumulative_amount1: U256,
    pub swap_liquidity: U256,
}

impl SwapResult {
    pub fn infeasible() -> Self {
        SwapResult {
            success: false,
            rounded_tick: 0,
            cumulative_amount0: U256::zero(),
            cumulative_amount1: U256::zero(),
            swap_liquidity: U256::zero(),
        }
    }
}

/// A fully resolved distribution over rounded ticks.
///
/// `cumulative_amount0(t)` is the token0 held in `[t, +inf)`,
/// `cumulative_amount1(t)` the token1 held in `(-inf, t]`. Inverses return
/// `(false, _)` when the amount cannot be met.
pub trait Distribution {
    fn tick_spacing(&self) -> i32;

    fn liquidity_density_x96(&self, rounded_tick: i32) -> Result<U256>;

    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256>;

    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256>;

    fn inverse_cumulative_amount0(&self, amount0: U256, total_liquidity: U256) -> Result<(bool, i32)>;

    fn inverse_cumulative_amount1(&self, amount1: U256, total_liquidity: U256) -> Result<(bool, i32)>;

    /// (density, cumulative0 strictly right of the tick, cumulative1 strictly left)
    fn query_densities(&self, rounded_tick: i32) -> Result<(U256, U256, U256)> {
        let ts = self.tick_spacing();
        Ok((
            self.liquidity_density_x96(rounded_tick)?,
            self.cumulative_amount0(rounded_tick.saturating_add(ts), Q96)?,
            self.cumulative_amount1(rounded_tick.saturating_sub(ts), Q96)?,
        ))
    }
}

/// Locates the tick reached after consuming the swap input and reports the
/// cumulative amounts around it.
pub fn compute_swap<D: Distribution + ?Sized>(distribution: &D, input: &SwapInput) -> Result<SwapResult> {
    let ts = distribution.tick_spacing();
    let SwapInput {
        inverse_cumulative_amount_input: amount,
        total_liquidity,
        zero_for_one,
        exact_in,
    } = *input;

    let (rounded_tick, cumulative_amount0, cumulative_amount1) = if exact_in == zero_for_one {
        let (success, tick) = distribution.inverse_cumulative_amount0(amount, total_liquidity)?;
        if !success {
            return Ok(SwapResult::infeasible());
        }
        let (tick0, tick1) = if exact_in { (tick + ts, tick) } else { (tick, tick - ts) };
        (
            tick,
            distribution.cumulative_amount0(tick0, total_liquidity)?,
            distribution.cumulative_amount1(tick1, total_liquidity)?,
        )
    } else {
        let (success, tick) = distribution.inverse_cumulative_amount1(amount, total_liquidity)?;
        if !success {
            return Ok(SwapResult::infeasible());
        }
        let (tick1, tick0) = if exact_in { (tick - ts, tick) } else { (tick, tick + ts) };
        (
            tick,
            distribution.cumulative_amount0(tick0, total_liquidity)?,
            distribution.cumulative_amount1(tick1, total_liquidity)?,
        )
    };

    let density = distribution.liquidity_density_x96(rounded_tick)?;
    let swap_liquidity = density.checked_mul(total_liquidity).ok_or(LdfError::Overflow)? >> 96;

    Ok(SwapResult {
        success: true,
        rounded_tick,
        cumulative_amount0,
        cumulative_amount1,
        swap_liquidity,
    })
}

/// Output of decoding params against the current observation.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<D> {
    pub distribution: D,
    pub new_state: LdfState,
    pub should_surge: bool,
}

/// Decoding half of a shape. Implementors get [`LiquidityDensityFunction`]
/// for free.
pub trait LdfShape: Send + Sync {
    type Output: Distribution;

    const KIND: LdfKind;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Self::Output>>;
}

/// Object-safe façade stored in the registry.
pub trait LiquidityDensityFunction: Send + Sync {
    fn kind(&self) -> LdfKind;

    fn is_valid_params(&self, tick_spacing: i32, twap_tick: i32, params: &LdfParams) -> bool;

    fn query(
        &self,
        tick_spacing: i32,
        rounded_tick: i32,
        twap_tick: i32,
        spot_price_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<QueryResult>;

    fn compute_swap(
        &self,
        tick_spacing: i32,
        input: &SwapInput,
        twap_tick: i32,
        spot_price_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<SwapResult>;
}

impl<T: LdfShape> LiquidityDensityFunction for T {
    fn kind(&self) -> LdfKind {
        T::KIND
    }

    fn is_valid_params(&self, tick_spacing: i32, twap_tick: i32, params: &LdfParams) -> bool {
        let resolved = check_tick(twap_tick)
            .and_then(|_| self.resolve(tick_spacing, twap_tick, params, &LdfState::default()));
        match resolved {
            Ok(_) => true,
            Err(e) => {
                log::debug!("{} rejected params {:?}: {}", T::KIND, params, e);
                false
            }
        }
    }

    fn query(
        &self,
        tick_spacing: i32,
        rounded_tick: i32,
        twap_tick: i32,
        _spot_price_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<QueryResult> {
        check_tick(rounded_tick)?;
        check_tick(twap_tick)?;
        let resolved = self.resolve(tick_spacing, twap_tick, params, state)?;
        let (density, cumulative0, cumulative1) = resolved.distribution.query_densities(rounded_tick)?;
        Ok(QueryResult {
            liquidity_density_x96: density,
            cumulative_amount0_density_x96: cumulative0,
            cumulative_amount1_density_x96: cumulative1,
            new_ldf_state: resolved.new_state,
            should_surge: resolved.should_surge,
        })
    }

    fn compute_swap(
        &self,
        tick_spacing: i32,
        input: &SwapInput,
        twap_tick: i32,
        _spot_price_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<SwapResult> {
        check_tick(twap_tick)?;
        let resolved = self.resolve(tick_spacing, twap_tick, params, state)?;
        let result = compute_swap(&resolved.distribution, input)?;
        if !result.success {
            log::debug!(
                "{} swap infeasible: amount {} zero_for_one {} exact_in {}",
                T::KIND,
                input.inverse_cumulative_amount_input,
                input.zero_for_one,
                input.exact_in
            );
        }
        Ok(result)
    }
}

fn check_tick(tick: i32) -> Result<()> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(LdfError::InvalidTick(tick));
    }
    Ok(())
}

/// `tick + offset` pinned to `[MIN_TICK, MAX_TICK]`.
pub(crate) fn offset_tick(tick: i32, offset: i32) -> i32 {
    (tick as i64 + offset as i64).clamp(MIN_TICK as i64, MAX_TICK as i64) as i32
}

pub(crate) fn check_tick_spacing(tick_spacing: i32) -> Result<()> {
    if tick_spacing <= 0 || tick_spacing > MAX_TICK {
        return Err(LdfError::InvalidTickSpacing(tick_spacing));
    }
    Ok(())
}

/// Rejects a static window `[lower, lower + length * ts)` that is misaligned
/// or leaves the usable range.
pub(crate) fn check_static_window(tick_spacing: i32, lower: i32, length: i32) -> Result<()> {
    if lower % tick_spacing != 0 {
        return Err(LdfError::InvalidParams("min tick not aligned to tick spacing"));
    }
    let upper = lower as i64 + length as i64 * tick_spacing as i64;
    if lower < min_usable_tick(tick_spacing) || upper > max_usable_tick(tick_spacing) as i64 {
        return Err(LdfError::InvalidParams("range outside usable ticks"));
    }
    Ok(())
}

/// Rejects a shifting window wider than the usable range.
pub(crate) fn check_window_width(tick_spacing: i32, length: i32) -> Result<()> {
    let width = length as i64 * tick_spacing as i64;
    if width > (max_usable_tick(tick_spacing) - min_usable_tick(tick_spacing)) as i64 {
        return Err(LdfError::InvalidParams("range wider than usable ticks"));
    }
    Ok(())
}
