use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::ldf::carpeted::MainWindow;
use crate::ldf::geometric::{alpha_x96, check_alpha, check_window, resolve_min_tick, Geometric};
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::ShiftMode;
use crate::ldf::{check_tick_spacing, Distribution, LdfKind, LdfShape, Resolved};
use crate::math::fixed_point::{full_mul_div, try_add, try_mul};

/// Two geometric curves side by side. The left curve covers `length1` ticks
/// from `min_tick`, the right curve the following `length0` ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleGeometric {
    pub tick_spacing: i32,
    pub min_tick: i32,
    pub length0: i32,
    pub alpha0_x96: U256,
    pub weight0: U256,
    pub length1: i32,
    pub alpha1_x96: U256,
    pub weight1: U256,
}

impl DoubleGeometric {
    /// Curve 0, anchored where the left curve ends.
    pub fn right(&self) -> Geometric {
        Geometric {
            tick_spacing: self.tick_spacing,
            min_tick: self.min_tick + self.length1 * self.tick_spacing,
            length: self.length0,
            alpha_x96: self.alpha0_x96,
        }
    }

    /// Curve 1.
    pub fn left(&self) -> Geometric {
        Geometric {
            tick_spacing: self.tick_spacing,
            min_tick: self.min_tick,
            length: self.length1,
            alpha_x96: self.alpha1_x96,
        }
    }

    fn total_weight(&self) -> Result<U256> {
        try_add(self.weight0, self.weight1)
    }

    /// `(right, left)` shares of `total_liquidity`, proportional to weight.
    pub fn liquidity(&self, total_liquidity: U256) -> Result<(U256, U256)> {
        let total_weight = self.total_weight()?;
        Ok((
            full_mul_div(total_liquidity, self.weight0, total_weight)?,
            full_mul_div(total_liquidity, self.weight1, total_weight)?,
        ))
    }
}

impl MainWindow for DoubleGeometric {
    fn min_tick(&self) -> i32 {
        self.min_tick
    }

    fn length(&self) -> i32 {
        self.length0 + self.length1
    }
}

impl Distribution for DoubleGeometric {
    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn liquidity_density_x96(&self, rounded_tick: i32) -> Result<U256> {
        let density0 = self.right().liquidity_density_x96(rounded_tick)?;
        let density1 = self.left().liquidity_density_x96(rounded_tick)?;
        let weighted = try_add(try_mul(density0, self.weight0)?, try_mul(density1, self.weight1)?)?;
        Ok(weighted / self.total_weight()?)
    }

    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        let (liquidity0, liquidity1) = self.liquidity(total_liquidity)?;
        try_add(
            self.right().cumulative_amount0(rounded_tick, liquidity0)?,
            self.left().cumulative_amount0(rounded_tick, liquidity1)?,
        )
    }

    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        let (liquidity0, liquidity1) = self.liquidity(total_liquidity)?;
        try_add(
            self.right().cumulative_amount1(rounded_tick, liquidity0)?,
            self.left().cumulative_amount1(rounded_tick, liquidity1)?,
        )
    }

    /// Right curve first, the remainder spills into the left curve.
    fn inverse_cumulative_amount0(&self, amount0: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        let (liquidity0, liquidity1) = self.liquidity(total_liquidity)?;
        let right = self.right();
        let right_amount0 = right.cumulative_amount0(right.min_tick, liquidity0)?;
        if amount0 <= right_amount0 {
            return right.inverse_cumulative_amount0(amount0, liquidity0);
        }
        self.left().inverse_cumulative_amount0(amount0 - right_amount0, liquidity1)
    }

    /// Left curve first, the remainder spills into the right curve.
    fn inverse_cumulative_amount1(&self, amount1: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        let (liquidity0, liquidity1) = self.liquidity(total_liquidity)?;
        let left = self.left();
        let left_amount1 = left.cumulative_amount1(left.max_tick(), liquidity1)?;
        if amount1 <= left_amount1 {
            return left.inverse_cumulative_amount1(amount1, liquidity1);
        }
        self.right().inverse_cumulative_amount1(amount1 - left_amount1, liquidity0)
    }
}

/// Decoded double geometric fields shared with the carpeted variant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DoubleGeometricParams {
    pub shift_mode: ShiftMode,
    pub min_tick_or_offset: i32,
    pub length0: i32,
    pub alpha0: u32,
    pub weight0: u32,
    pub length1: i32,
    pub alpha1: u32,
    pub weight1: u32,
}

impl DoubleGeometricParams {
    pub fn decode(tick_spacing: i32, params: &LdfParams) -> Result<Self> {
        check_tick_spacing(tick_spacing)?;
        let decoded = DoubleGeometricParams {
            shift_mode: params.shift_mode()?,
            min_tick_or_offset: params.i24_at(1),
            length0: params.i16_at(4) as i32,
            alpha0: params.u32_at(6),
            weight0: params.u32_at(10),
            length1: params.i16_at(14) as i32,
            alpha1: params.u32_at(16),
            weight1: params.u32_at(20),
        };

        if decoded.length0 <= 0 || decoded.length1 <= 0 {
            return Err(LdfError::InvalidParams("length must be positive"));
        }
        if decoded.weight0 == 0 || decoded.weight1 == 0 {
            return Err(LdfError::InvalidParams("weight must be nonzero"));
        }
        check_window(
            tick_spacing,
            decoded.shift_mode,
            decoded.min_tick_or_offset,
            decoded.length0 + decoded.length1,
        )?;
        check_alpha(tick_spacing, decoded.length0, decoded.alpha0)?;
        check_alpha(tick_spacing, decoded.length1, decoded.alpha1)?;
        Ok(decoded)
    }

    /// Resolves the anchor and builds the curve pair.
    pub fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        state: &LdfState,
    ) -> Result<Resolved<DoubleGeometric>> {
        let (min_tick, new_state, should_surge) = resolve_min_tick(
            tick_spacing,
            twap_tick,
            self.min_tick_or_offset,
            self.length0 + self.length1,
            self.shift_mode,
            state,
        );
        Ok(Resolved {
            distribution: DoubleGeometric {
                tick_spacing,
                min_tick,
                length0: self.length0,
                alpha0_x96: alpha_x96(self.alpha0)?,
                weight0: U256::from(self.weight0),
                length1: self.length1,
                alpha1_x96: alpha_x96(self.alpha1)?,
                weight1: U256::from(self.weight1),
            },
            new_state,
            should_surge,
        })
    }
}

/// `| shiftMode: u8 | minTickOrOffset: i24 | length0: i16 | alpha0: u32 | weight0: u32 | length1: i16 | alpha1: u32 | weight1: u32 |`
#[allow(clippy::too_many_arguments)]
pub fn encode_params(
    shift_mode: ShiftMode,
    min_tick_or_offset: i32,
    length0: i16,
    alpha0: u32,
    weight0: u32,
    length1: i16,
    alpha1: u32,
    weight1: u32,
) -> LdfParams {
    LdfParams::default()
        .with_shift_mode(shift_mode)
        .with_i24(1, min_tick_or_offset)
        .with_i16(4, length0)
        .with_u32(6, alpha0)
        .with_u32(10, weight0)
        .with_i16(14, length1)
        .with_u32(16, alpha1)
        .with_u32(20, weight1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleGeometricDistribution;

impl LdfShape for DoubleGeometricDistribution {
    type Output = DoubleGeometric;

    const KIND: LdfKind = LdfKind::DoubleGeometric;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<DoubleGeometric>> {
        DoubleGeometricParams::decode(tick_spacing, params)?.resolve(tick_spacing, twap_tick, state)
    }
}
