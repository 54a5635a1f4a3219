use crate::error::Result;
use crate::ldf::carpeted::Carpeted;
use crate::ldf::carpeted_geometric::decode_weight_carpet;
use crate::ldf::double_geometric::{self, DoubleGeometric, DoubleGeometricParams};
use crate::ldf::packed::{LdfParams, LdfState};
use crate::ldf::shift_mode::ShiftMode;
use crate::ldf::{LdfKind, LdfShape, Resolved};

const WEIGHT_CARPET_OFFSET: usize = 24;

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
    weight_carpet: u32,
) -> LdfParams {
    double_geometric::encode_params(
        shift_mode,
        min_tick_or_offset,
        length0,
        alpha0,
        weight0,
        length1,
        alpha1,
        weight1,
    )
    .with_u32(WEIGHT_CARPET_OFFSET, weight_carpet)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CarpetedDoubleGeometricDistribution;

impl LdfShape for CarpetedDoubleGeometricDistribution {
    type Output = Carpeted<DoubleGeometric>;

    const KIND: LdfKind = LdfKind::CarpetedDoubleGeometric;

    fn resolve(
        &self,
        tick_spacing: i32,
        twap_tick: i32,
        params: &LdfParams,
        state: &LdfState,
    ) -> Result<Resolved<Carpeted<DoubleGeometric>>> {
        let weight_carpet = decode_weight_carpet(params, WEIGHT_CARPET_OFFSET)?;
        let resolved = DoubleGeometricParams::decode(tick_spacing, params)?.resolve(tick_spacing, twap_tick, state)?;
        Ok(Resolved {
            distribution: Carpeted::new(resolved.distribution, weight_carpet),
            new_state: resolved.new_state,
            should_surge: resolved.should_surge,
        })
    }
}
