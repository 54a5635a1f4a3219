use crate::error::{LdfError, Result};
use crate::ldf::geometric::{alpha_x96, check_alpha, check_window, Geometric};
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::ShiftMode;
use crate::ldf::{check_tick_spacing, LdfKind, LdfShape, Resolved};

// A static geometric window whose alpha flips to `alt_alpha` while the TWAP
// sits past a threshold. The persisted state remembers the last TWAP so a
// regime change can be flagged as a surge.

/// Whether `twap_tick` is in the alternate regime. A set direction means
/// the alternate alpha applies at or below the threshold.
pub fn should_use_alt_alpha(twap_tick: i32, alt_threshold: i32, alt_threshold_direction: bool) -> bool {
    if alt_threshold_direction {
        twap_tick <= alt_threshold
    } else {
        twap_tick >= alt_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyTheDipParams {
    pub min_tick: i32,
    pub length: i32,
    pub alpha: u32,
    pub alt_alpha: u32,
    pub alt_threshold: i32,
    pub alt_threshold_direction: bool,
}

impl BuyTheDipParams {
    /// Byte 0 is ignored; the window is always static.
    pub fn decode(params: &LdfParams) -> Self {
        BuyTheDipParams {
            min_tick: params.i24_at(1),
            length: params.i16_at(4) as i32,
            alpha: params.u32_at(6),
            alt_alpha: params.u32_at(10),
            alt_threshold: params.i24_at(14),
            alt_threshold_direction: params.u8_at(17) != 0,
        }
    }

    /// `| shiftMode: u8 | minTick: i24 | length: i16 | alpha: u32 | altAlpha: u32 | altThreshold: i24 | altThresholdDirection: u8 |`
    pub fn encode(&self) -> LdfParams {
        LdfParams::default()
            .with_shift_mode(ShiftMode::Static)
            .with_i24(1, self.min_tick)
            .with_i16(4, self.length as i16)
            .with_u32(6, self.alpha)
            .with_u32(10, self.alt_alpha)
            .with_i24(14, self.alt_threshold)
            .with_u8(17, self.alt_threshold_direction as u8)
    }

    fn validate(&self, tick_spacing: i32) -> Result<()> {
        check_window(tick_spacing, ShiftMode::Static, self.min_tick, self.length)?;
        check_alpha(tick_spacing, self.length, self.alpha)?;
        check_alpha(tick_spacing, self.length, self.alt_alpha)?;
        if self.alpha == self.alt_alpha {
            return Err(LdfError::InvalidParams("alt alpha must differ from alpha"));
        }
        Ok(())
    }

    fn use_alt_alpha(&self, twap_tick: i32) -> bool {
        should_use_alt_alpha(twap_tick, self.alt_threshold, self.alt_threshold_direction)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuyTheDipGeometricDistribution;

impl LdfShape for BuyTheDipGeometricDistribution {
    type Output = Geometric;

    const KIND: LdfKind = LdfKind::BuyTheDipGeometric;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Geometric>> {
        check_tick_spacing(tick_spacing)?;
        let decoded = BuyTheDipParams::decode(params);
        decoded.validate(tick_spacing)?;

        let use_alt = decoded.use_alt_alpha(twap_tick);
        let should_surge = state.is_initialized() && use_alt != decoded.use_alt_alpha(state.last_tick());
        if should_surge {
            log::debug!("buy the dip regime flipped at twap {} (alt alpha {})", twap_tick, use_alt);
        }

        let alpha = if use_alt { decoded.alt_alpha } else { decoded.alpha };
        Ok(Resolved {
            distribution: Geometric {
                tick_spacing,
                min_tick: decoded.min_tick,
                length: decoded.length,
                alpha_x96: alpha_x96(alpha)?,
            },
            new_state: LdfState::with_anchor(twap_tick),
            should_surge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: i32 = 60;

    fn dip() -> BuyTheDipParams {
        BuyTheDipParams {
            min_tick: -600,
            length: 20,
            alpha: 90_000_000,
            alt_alpha: 110_000_000,
            alt_threshold: -300,
            alt_threshold_direction: true,
        }
    }

    #[test]
    fn test_threshold_direction() {
        assert!(should_use_alt_alpha(-300, -300, true));
        assert!(should_use_alt_alpha(-301, -300, true));
        assert!(!should_use_alt_alpha(-299, -300, true));
        assert!(should_use_alt_alpha(-300, -300, false));
        assert!(should_use_alt_alpha(0, -300, false));
        assert!(!should_use_alt_alpha(-301, -300, false));
    }

    #[test]
    fn test_layout_round_trip() {
        let params = dip().encode();
        assert_eq!(params.u8_at(17), 1);
        assert_eq!(params.i24_at(14), -300);
        assert_eq!(BuyTheDipParams::decode(&params), dip());
    }

    #[test]
    fn test_alpha_follows_regime() {
        let params = dip().encode();
        let above = BuyTheDipGeometricDistribution.resolve(TS, 0, &params, &LdfState::default()).unwrap();
        assert_eq!(above.distribution.alpha_x96, alpha_x96(90_000_000).unwrap());
        let below = BuyTheDipGeometricDistribution.resolve(TS, -900, &params, &LdfState::default()).unwrap();
        assert_eq!(below.distribution.alpha_x96, alpha_x96(110_000_000).unwrap());
        // the window never moves
        assert_eq!(below.distribution.min_tick, -600);
    }

    #[test]
    fn test_state_remembers_twap() {
        let params = dip().encode();
        let resolved = BuyTheDipGeometricDistribution.resolve(TS, 1234, &params, &LdfState::default()).unwrap();
        assert_eq!(resolved.new_state, LdfState::with_anchor(1234));
        assert!(!resolved.should_surge);
    }

    #[test]
    fn test_surge_on_regime_flip_only() {
        let params = dip().encode();
        let shape = BuyTheDipGeometricDistribution;
        let last_above = LdfState::with_anchor(0);

        assert!(!shape.resolve(TS, 100, &params, &last_above).unwrap().should_surge);
        assert!(shape.resolve(TS, -400, &params, &last_above).unwrap().should_surge);

        let last_below = LdfState::with_anchor(-1000);
        assert!(!shape.resolve(TS, -400, &params, &last_below).unwrap().should_surge);
        assert!(shape.resolve(TS, 0, &params, &last_below).unwrap().should_surge);
    }

    #[test]
    fn test_shift_mode_byte_is_ignored() {
        let params = dip().encode().with_u8(0, 9);
        let resolved = BuyTheDipGeometricDistribution.resolve(TS, 6000, &params, &LdfState::default()).unwrap();
        assert_eq!(resolved.distribution.min_tick, -600);
    }

    #[test]
    fn test_params_validation() {
        let shape = BuyTheDipGeometricDistribution;
        let state = LdfState::default();
        for bad in [
            BuyTheDipParams { alt_alpha: 90_000_000, ..dip() },
            BuyTheDipParams { alpha: 0, ..dip() },
            BuyTheDipParams { alt_alpha: 0, ..dip() },
            BuyTheDipParams { length: 0, ..dip() },
            BuyTheDipParams { min_tick: -610, ..dip() },
            BuyTheDipParams { alt_alpha: 1, ..dip() },
        ] {
            assert!(shape.resolve(TS, 0, &bad.encode(), &state).is_err(), "{:?}", bad);
        }
    }
}
