use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::ldf::{uniform, Distribution};
use crate::math::fixed_point::{div_up, full_mul_div, try_add, Q96, WAD};
use crate::math::tick_math::{max_usable_tick, min_usable_tick};

/// Query scaling for carpeted shapes: cumulative densities are evaluated at
/// `Q96 << 4` total liquidity and shifted back, so the thin carpets do not
/// round to zero.
pub const QUERY_SCALE_SHIFT: usize = 4;

/// A shape that can sit in the middle of a carpet.
pub trait MainWindow: Distribution {
    fn min_tick(&self) -> i32;

    /// Width in rounded ticks.
    fn length(&self) -> i32;

    fn max_tick(&self) -> i32 {
        self.min_tick() + self.length() * self.tick_spacing()
    }
}

/// How total liquidity splits between the two carpets and the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarpetedLiquidity {
    pub left: U256,
    pub main: U256,
    pub right: U256,
}

#[inline]
fn carpeted_tick_count(tick_spacing: i32, length: i32) -> i32 {
    (max_usable_tick(tick_spacing) - min_usable_tick(tick_spacing)) / tick_spacing - length
}

/// Splits `total_liquidity`: `WAD - weight_carpet` goes to the main window
/// and the rest is spread over every usable tick outside it, each side
/// getting its share by tick count.
pub fn carpeted_liquidity(
    tick_spacing: i32,
    total_liquidity: U256,
    min_tick: i32,
    length: i32,
    weight_carpet: U256,
) -> Result<CarpetedLiquidity> {
    let num_carpeted = carpeted_tick_count(tick_spacing, length);
    if num_carpeted <= 0 {
        return Ok(CarpetedLiquidity { left: U256::zero(), main: total_liquidity, right: U256::zero() });
    }

    let main = full_mul_div(total_liquidity, main_weight(weight_carpet)?, WAD)?;
    let carpet = total_liquidity - main;
    let right_ticks = (max_usable_tick(tick_spacing) - min_tick) / tick_spacing - length;
    let right = full_mul_div(carpet, U256::from(right_ticks as u64), U256::from(num_carpeted as u64))?;
    Ok(CarpetedLiquidity { left: carpet - right, main, right })
}

#[inline]
fn main_weight(weight_carpet: U256) -> Result<U256> {
    WAD.checked_sub(weight_carpet)
        .ok_or(LdfError::InvalidParams("carpet weight above WAD"))
}

/// A main window flanked by uniform carpets reaching the usable tick bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carpeted<M> {
    pub main: M,
    pub weight_carpet: U256,
}

impl<M: MainWindow> Carpeted<M> {
    pub fn new(main: M, weight_carpet: U256) -> Self {
        Carpeted { main, weight_carpet }
    }

    pub fn liquidity(&self, total_liquidity: U256) -> Result<CarpetedLiquidity> {
        carpeted_liquidity(
            self.main.tick_spacing(),
            total_liquidity,
            self.main.min_tick(),
            self.main.length(),
            self.weight_carpet,
        )
    }

    fn min_usable(&self) -> i32 {
        min_usable_tick(self.main.tick_spacing())
    }

    fn max_usable(&self) -> i32 {
        max_usable_tick(self.main.tick_spacing())
    }
}

impl<M: MainWindow> Distribution for Carpeted<M> {
    fn tick_spacing(&self) -> i32 {
        self.main.tick_spacing()
    }

    fn liquidity_density_x96(&self, rounded_tick: i32) -> Result<U256> {
        if rounded_tick >= self.main.min_tick() && rounded_tick < self.main.max_tick() {
            let density = self.main.liquidity_density_x96(rounded_tick)?;
            return full_mul_div(density, main_weight(self.weight_carpet)?, WAD);
        }
        let num_carpeted = carpeted_tick_count(self.tick_spacing(), self.main.length());
        if num_carpeted <= 0 {
            return Ok(U256::zero());
        }
        let main = full_mul_div(Q96, main_weight(self.weight_carpet)?, WAD)?;
        div_up(Q96 - main, U256::from(num_carpeted as u64))
    }

    fn cumulative_amount0(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        let ts = self.tick_spacing();
        let liquidity = self.liquidity(total_liquidity)?;
        let left = uniform::cumulative_amount0(
            ts,
            rounded_tick,
            liquidity.left,
            self.min_usable(),
            self.main.min_tick(),
            true,
        )?;
        let main = self.main.cumulative_amount0(rounded_tick, liquidity.main)?;
        let right = uniform::cumulative_amount0(
            ts,
            rounded_tick,
            liquidity.right,
            self.main.max_tick(),
            self.max_usable(),
            true,
        )?;
        try_add(try_add(left, main)?, right)
    }

    fn cumulative_amount1(&self, rounded_tick: i32, total_liquidity: U256) -> Result<U256> {
        let ts = self.tick_spacing();
        let liquidity = self.liquidity(total_liquidity)?;
        let left = uniform::cumulative_amount1(
            ts,
            rounded_tick,
            liquidity.left,
            self.min_usable(),
            self.main.min_tick(),
            true,
        )?;
        let main = self.main.cumulative_amount1(rounded_tick, liquidity.main)?;
        let right = uniform::cumulative_amount1(
            ts,
            rounded_tick,
            liquidity.right,
            self.main.max_tick(),
            self.max_usable(),
            true,
        )?;
        try_add(try_add(left, main)?, right)
    }

    /// Walks right carpet, main window, left carpet.
    fn inverse_cumulative_amount0(&self, amount0: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        if amount0.is_zero() {
            return Ok((true, self.max_usable()));
        }
        let ts = self.tick_spacing();
        let liquidity = self.liquidity(total_liquidity)?;
        let main_max = self.main.max_tick();

        let right_amount0 =
            uniform::cumulative_amount0(ts, main_max, liquidity.right, main_max, self.max_usable(), true)?;
        if amount0 <= right_amount0 && !liquidity.right.is_zero() {
            return Ok(uniform::inverse_cumulative_amount0(
                ts,
                amount0,
                liquidity.right,
                main_max,
                self.max_usable(),
                true,
            ));
        }

        let remainder = amount0 - right_amount0;
        let main_amount0 = self.main.cumulative_amount0(self.main.min_tick(), liquidity.main)?;
        if remainder <= main_amount0 {
            return self.main.inverse_cumulative_amount0(remainder, liquidity.main);
        }
        if liquidity.left.is_zero() {
            return Ok((false, 0));
        }
        Ok(uniform::inverse_cumulative_amount0(
            ts,
            remainder - main_amount0,
            liquidity.left,
            self.min_usable(),
            self.main.min_tick(),
            true,
        ))
    }

    /// Walks left carpet, main window, right carpet.
    fn inverse_cumulative_amount1(&self, amount1: U256, total_liquidity: U256) -> Result<(bool, i32)> {
        let ts = self.tick_spacing();
        if amount1.is_zero() {
            return Ok((true, self.min_usable() - ts));
        }
        let liquidity = self.liquidity(total_liquidity)?;
        let main_min = self.main.min_tick();

        let left_amount1 =
            uniform::cumulative_amount1(ts, main_min, liquidity.left, self.min_usable(), main_min, true)?;
        if amount1 <= left_amount1 && !liquidity.left.is_zero() {
            return Ok(uniform::inverse_cumulative_amount1(
                ts,
                amount1,
                liquidity.left,
                self.min_usable(),
                main_min,
                true,
            ));
        }

        let remainder = amount1 - left_amount1;
        let main_amount1 = self.main.cumulative_amount1(self.main.max_tick(), liquidity.main)?;
        if remainder <= main_amount1 {
            return self.main.inverse_cumulative_amount1(remainder, liquidity.main);
        }
        if liquidity.right.is_zero() {
            return Ok((false, 0));
        }
        Ok(uniform::inverse_cumulative_amount1(
            ts,
            remainder - main_amount1,
            liquidity.right,
            self.main.max_tick(),
            self.max_usable(),
            true,
        ))
    }

    fn query_densities(&self, rounded_tick: i32) -> Result<(U256, U256, U256)> {
        let ts = self.tick_spacing();
        let scale = Q96 << QUERY_SCALE_SHIFT;
        Ok((
            self.liquidity_density_x96(rounded_tick)?,
            self.cumulative_amount0(rounded_tick.saturating_add(ts), scale)? >> QUERY_SCALE_SHIFT,
            self.cumulative_amount1(rounded_tick.saturating_sub(ts), scale)? >> QUERY_SCALE_SHIFT,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldf::geometric::{alpha_x96, Geometric};

    const TS: i32 = 60;

    fn main_window() -> Geometric {
        Geometric { tick_spacing: TS, min_tick: -600, length: 20, alpha_x96: alpha_x96(90_000_000).unwrap() }
    }

    fn carpet_weight() -> U256 {
        // 1%
        U256::exp10(16)
    }

    #[test]
    fn test_liquidity_split() {
        let total = U256::exp10(18);
        let split = carpeted_liquidity(TS, total, -600, 20, carpet_weight()).unwrap();
        assert_eq!(split.main, U256::exp10(18) * 99 / 100);
        assert_eq!(split.left + split.main + split.right, total);
        // both carpets span 14777 rounded ticks
        assert_eq!(split.left, U256::exp10(16) / 2);
        assert_eq!(split.right, U256::exp10(16) / 2);

        let skewed = carpeted_liquidity(TS, total, 600, 20, carpet_weight()).unwrap();
        assert!(skewed.right < skewed.left);
        assert_eq!(skewed.left + skewed.main + skewed.right, total);
    }

    #[test]
    fn test_full_range_window_has_no_carpet() {
        let split = carpeted_liquidity(TS, U256::exp10(18), -887_220, 887_220 * 2 / TS, carpet_weight()).unwrap();
        assert_eq!(split.main, U256::exp10(18));
        assert!(split.left.is_zero() && split.right.is_zero());
    }

    #[test]
    fn test_weight_above_wad_is_rejected() {
        assert!(carpeted_liquidity(TS, U256::exp10(18), -600, 20, WAD + 1).is_err());
    }

    #[test]
    fn test_density_inside_and_outside_window() {
        let carpeted = Carpeted::new(main_window(), carpet_weight());
        let inside = carpeted.liquidity_density_x96(0).unwrap();
        let main_only = main_window().liquidity_density_x96(0).unwrap();
        assert_eq!(inside, main_only * 99 / 100);

        let num = U256::from(((887_220 * 2) / TS - 20) as u64);
        let carpet_total = Q96 - Q96 * 99 / 100;
        let expected = (carpet_total + num - 1) / num;
        assert_eq!(carpeted.liquidity_density_x96(-887_220).unwrap(), expected);
        assert_eq!(carpeted.liquidity_density_x96(600).unwrap(), expected);
    }

    #[test]
    fn test_cumulative_amounts_include_carpets() {
        let carpeted = Carpeted::new(main_window(), carpet_weight());
        let l = U256::exp10(18);
        let split = carpeted.liquidity(l).unwrap();
        let main0 = main_window().cumulative_amount0(-600, split.main).unwrap();
        let total0 = carpeted.cumulative_amount0(-600, l).unwrap();
        assert!(total0 > main0);
        // beyond the usable range nothing is left
        assert!(carpeted.cumulative_amount0(887_220, l).unwrap().is_zero());
        assert!(carpeted.cumulative_amount1(-887_280, l).unwrap().is_zero());
    }

    #[test]
    fn test_inverse_walks_all_segments() {
        let carpeted = Carpeted::new(main_window(), carpet_weight());
        // carpets are thin, keep enough liquidity that one wei is less than a tick
        let l = U256::exp10(24);
        for tick in [-600_000, -660, -600, 0, 540, 600, 660, 600_000] {
            let amount0 = carpeted.cumulative_amount0(tick, l).unwrap();
            let (ok, found) = carpeted.inverse_cumulative_amount0(amount0, l).unwrap();
            assert!(ok && (found - tick).abs() <= TS, "inverse0 tick {} found {}", tick, found);
            assert!(carpeted.cumulative_amount0(found, l).unwrap() >= amount0);

            let amount1 = carpeted.cumulative_amount1(tick, l).unwrap();
            let (ok, found) = carpeted.inverse_cumulative_amount1(amount1, l).unwrap();
            assert!(ok && (found - tick).abs() <= TS, "inverse1 tick {} found {}", tick, found);
            assert!(carpeted.cumulative_amount1(found, l).unwrap() >= amount1);
        }
    }

    #[test]
    fn test_inverse_zero_and_excess() {
        let carpeted = Carpeted::new(main_window(), carpet_weight());
        let l = U256::exp10(24);
        assert_eq!(carpeted.inverse_cumulative_amount0(U256::zero(), l).unwrap(), (true, 887_220));
        assert_eq!(carpeted.inverse_cumulative_amount1(U256::zero(), l).unwrap(), (true, -887_280));
        let all0 = carpeted.cumulative_amount0(-887_220, l).unwrap();
        assert!(!carpeted.inverse_cumulative_amount0(all0 * 2, l).unwrap().0);
        let all1 = carpeted.cumulative_amount1(887_160, l).unwrap();
        assert!(!carpeted.inverse_cumulative_amount1(all1 * 2, l).unwrap().0);
    }
}
