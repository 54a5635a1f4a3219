// tests/math_properties.rs
// ===================================
// Property tests for the fixed-point kernel, tick math and shift policy.

use bunni_ldf::ldf::shift_mode::enforce_shift_mode;
use bunni_ldf::math::fixed_point::{full_mul_div, full_mul_div_up, mul_div, rpow, Q96};
use bunni_ldf::math::tick_math::{
    get_sqrt_price_at_tick, get_tick_at_sqrt_price, round_tick_single, MAX_TICK, MIN_TICK,
};
use bunni_ldf::{LdfError, ShiftMode};
use primitive_types::U256;
use proptest::prelude::*;

/// Words with the top bit set, i.e. at least 2^255.
fn huge_u256() -> impl Strategy<Value = U256> {
    any::<[u64; 4]>().prop_map(|mut words| {
        words[3] |= 1 << 63;
        U256(words)
    })
}

fn at_least_2_pow_128() -> impl Strategy<Value = U256> {
    any::<[u64; 4]>().prop_map(|mut words| {
        words[2] |= 1;
        U256(words)
    })
}

fn shift_mode() -> impl Strategy<Value = ShiftMode> {
    prop_oneof![
        Just(ShiftMode::Both),
        Just(ShiftMode::Left),
        Just(ShiftMode::Right),
        Just(ShiftMode::Static),
    ]
}

proptest! {
    #[test]
    fn full_mul_div_overflow_is_reported(a in huge_u256(), b in huge_u256(), d in 1u64..u64::MAX) {
        prop_assert_eq!(full_mul_div(a, b, U256::from(d)), Err(LdfError::FullMulDivFailed));
        prop_assert_eq!(full_mul_div_up(a, b, U256::from(d)), Err(LdfError::FullMulDivFailed));
    }

    #[test]
    fn full_mul_div_matches_wide_product(a in any::<u128>(), b in any::<u128>(), d in 1u128..=u128::MAX) {
        let expected = U256::from(a) * U256::from(b) / U256::from(d);
        prop_assert_eq!(full_mul_div(U256::from(a), U256::from(b), U256::from(d)).unwrap(), expected);

        let up = full_mul_div_up(U256::from(a), U256::from(b), U256::from(d)).unwrap();
        let exact = (U256::from(a) * U256::from(b)) % U256::from(d) == U256::zero();
        prop_assert_eq!(up, if exact { expected } else { expected + U256::one() });
    }

    #[test]
    fn full_mul_div_survives_256_bit_products(a in huge_u256(), b in huge_u256()) {
        // a * b overflows 256 bits but a * b / b == a
        prop_assert_eq!(full_mul_div(a, b, b).unwrap(), a);
        prop_assert_eq!(mul_div(a, b, b), Err(LdfError::MulDivFailed));
    }

    #[test]
    fn rpow_overflow_is_reported(x in at_least_2_pow_128(), n in 2u32..64) {
        prop_assert_eq!(rpow(x, n, Q96), Err(LdfError::RpowOverflow));
    }

    #[test]
    fn rpow_below_base_stays_below_base(x in 0u128..(1u128 << 96), n in 0u32..512) {
        let result = rpow(U256::from(x), n, Q96).unwrap();
        prop_assert!(result <= Q96);
    }

    #[test]
    fn tick_round_trips_through_sqrt_price(tick in MIN_TICK..MAX_TICK) {
        let sqrt_price = get_sqrt_price_at_tick(tick).unwrap();
        prop_assert_eq!(get_tick_at_sqrt_price(sqrt_price).unwrap(), tick);
    }

    #[test]
    fn sqrt_price_is_increasing(tick in MIN_TICK..MAX_TICK) {
        prop_assert!(get_sqrt_price_at_tick(tick).unwrap() < get_sqrt_price_at_tick(tick + 1).unwrap());
    }

    #[test]
    fn round_tick_single_floors(tick in MIN_TICK..=MAX_TICK, tick_spacing in 1i32..20_000) {
        let rounded = round_tick_single(tick, tick_spacing);
        prop_assert_eq!(rounded % tick_spacing, 0);
        prop_assert!(rounded <= tick && tick - rounded < tick_spacing);
    }

    #[test]
    fn shift_mode_is_idempotent(tick in MIN_TICK..=MAX_TICK, mode in shift_mode()) {
        prop_assert_eq!(enforce_shift_mode(tick, tick, mode), tick);
    }

    #[test]
    fn shift_mode_respects_direction(tick in MIN_TICK..=MAX_TICK, last in MIN_TICK..=MAX_TICK) {
        prop_assert!(enforce_shift_mode(tick, last, ShiftMode::Left) <= last);
        prop_assert!(enforce_shift_mode(tick, last, ShiftMode::Right) >= last);
        prop_assert_eq!(enforce_shift_mode(tick, last, ShiftMode::Both), tick);
    }
}

#[test]
fn test_extreme_operands() {
    assert_eq!(full_mul_div(U256::MAX, U256::MAX, U256::MAX).unwrap(), U256::MAX);
    assert_eq!(full_mul_div(U256::MAX, U256::from(2u64), U256::MAX), Ok(U256::from(2u64)));
    assert_eq!(full_mul_div(U256::MAX, U256::from(2u64), U256::one()), Err(LdfError::FullMulDivFailed));
    assert_eq!(full_mul_div(U256::one(), U256::one(), U256::zero()), Err(LdfError::FullMulDivFailed));
    assert_eq!(rpow(U256::MAX, 2, Q96), Err(LdfError::RpowOverflow));
    assert_eq!(rpow(Q96, 1_000_000, Q96), Ok(Q96));
}
