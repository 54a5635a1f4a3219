use primitive_types::U256;

use crate::error::{LdfError, Result};

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// get_sqrt_price_at_tick(MIN_TICK)
pub const MIN_SQRT_PRICE: U256 = U256([0x1000276a3, 0, 0, 0]);
/// get_sqrt_price_at_tick(MAX_TICK)
pub const MAX_SQRT_PRICE: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

// -------------------------------- Tick Math --------------------------------

/// Exact TickMath.getSqrtPriceAtTick (Q64.96), canonical constants.
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(LdfError::InvalidTick(tick));
    }
    let abs_tick = tick.unsigned_abs();

    // ratio is Q128.128
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256([0xaa2d162d1a594001, 0xfffcb933bd6fad37, 0, 0])
    } else {
        U256::one() << 128
    };

    macro_rules! ms {
        ($hi:literal, $lo:literal, $mask:literal) => {
            if abs_tick & $mask != 0 {
                ratio = (ratio * U256([$lo, $hi, 0, 0])) >> 128;
            }
        };
    }

    ms!(0xfff97272373d4132, 0x59a46990580e213a, 0x2);
    ms!(0xfff2e50f5f656932, 0xef12357cf3c7fdcc, 0x4);
    ms!(0xffe5caca7e10e4e6, 0x1c3624eaa0941cd0, 0x8);
    ms!(0xffcb9843d60f6159, 0xc9db58835c926644, 0x10);
    ms!(0xff973b41fa98c081, 0x472e6896dfb254c0, 0x20);
    ms!(0xff2ea16466c96a38, 0x43ec78b326b52861, 0x40);
    ms!(0xfe5dee046a99a2a8, 0x11c461f1969c3053, 0x80);
    ms!(0xfcbe86c7900a88ae, 0xdcffc83b479aa3a4, 0x100);
    ms!(0xf987a7253ac41317, 0x6f2b074cf7815e54, 0x200);
    ms!(0xf3392b0822b70005, 0x940c7a398e4b70f3, 0x400);
    ms!(0xe7159475a2c29b74, 0x43b29c7fa6e889d9, 0x800);
    ms!(0xd097f3bdfd2022b8, 0x845ad8f792aa5825, 0x1000);
    ms!(0xa9f746462d870fdf, 0x8a65dc1f90e061e5, 0x2000);
    ms!(0x70d869a156d2a1b8, 0x90bb3df62baf32f7, 0x4000);
    ms!(0x31be135f97d08fd9, 0x81231505542fcfa6, 0x8000);
    ms!(0x09aa508b5b7a84e1, 0xc677de54f3e99bc9, 0x10000);
    ms!(0x005d6af8dedb8119, 0x6699c329225ee604, 0x20000);
    ms!(0x00002216e584f5fa, 0x1ea926041bedfe98, 0x40000);
    ms!(0x00000000048a1703, 0x91f7dc42444e8fa2, 0x80000);

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }
    // round-up shift by 32 (Q128.128 -> Q64.96)
    Ok((ratio + U256::from(0xffff_ffffu64)) >> 32)
}

/// Greatest tick whose sqrt price is <= `sqrt_price_x96`.
///
/// Binary search over the exact forward conversion, so it agrees with
/// `get_sqrt_price_at_tick` on every grid point.
pub fn get_tick_at_sqrt_price(sqrt_price_x96: U256) -> Result<i32> {
    if sqrt_price_x96 < MIN_SQRT_PRICE || sqrt_price_x96 >= MAX_SQRT_PRICE {
        return Err(LdfError::InvalidSqrtPrice(sqrt_price_x96));
    }
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if get_sqrt_price_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

// ------------------------------ Tick Rounding ------------------------------

#[inline]
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

#[inline]
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Floors `tick` to a multiple of `tick_spacing` (toward negative infinity).
#[inline]
pub fn round_tick_single(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing) * tick_spacing
}

/// Returns the rounded tick and the next rounded tick to its right.
#[inline]
pub fn round_tick(tick: i32, tick_spacing: i32) -> (i32, i32) {
    let rounded = round_tick_single(tick, tick_spacing);
    (rounded, rounded + tick_spacing)
}
