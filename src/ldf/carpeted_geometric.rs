use primitive_types::U256;

use crate::error::{LdfError, Result};
use crate::ldf::carpeted::Carpeted;
use crate::ldf::geometric::{self, Geometric, GeometricDistribution};
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::ShiftMode;
use crate::ldf::{LdfKind, LdfShape, Resolved};
use crate::math::fixed_point::WAD;

pub(crate) const WEIGHT_CARPET_OFFSET: usize = 10;

/// Reads the carpet weight as a WAD fraction.
pub(crate) fn decode_weight_carpet(params: &LdfParams, offset: usize) -> Result<U256> {
    let weight_carpet = U256::from(params.u32_at(offset));
    if weight_carpet > WAD {
        return Err(LdfError::InvalidParams("carpet weight above WAD"));
    }
    Ok(weight_carpet)
}

/// `| shiftMode: u8 | minTickOrOffset: i24 | length: i16 | alpha: u32 | weightCarpet: u32 |`
pub fn encode_params(
    shift_mode: ShiftMode,
    min_tick_or_offset: i32,
    length: i16,
    alpha: u32,
    weight_carpet: u32,
) -> LdfParams {
    geometric::encode_params(shift_mode, min_tick_or_offset, length, alpha).with_u32(WEIGHT_CARPET_OFFSET, weight_carpet)
}

/// Geometric window with uniform carpets over the rest of the usable range.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarpetedGeometricDistribution;

impl LdfShape for CarpetedGeometricDistribution {
    type Output = Carpeted<Geometric>;

    const KIND: LdfKind = LdfKind::CarpetedGeometric;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Carpeted<Geometric>>> {
        let weight_carpet = decode_weight_carpet(params, WEIGHT_CARPET_OFFSET)?;
        let resolved = GeometricDistribution.resolve(tick_spacing, twap_tick, params, state)?;
        Ok(Resolved {
            distribution: Carpeted::new(resolved.distribution, weight_carpet),
            new_state: resolved.new_state,
            should_surge: resolved.should_surge,
        })
    }
}
