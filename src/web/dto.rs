use primitive_types::U256;
use rocket::serde::{Deserialize, Serialize};

use crate::ldf::{LdfKind, LdfParams, LdfState, QueryResult, SwapResult};

// 256-bit values travel as decimal strings, packed words as 0x hex.

#[derive(Deserialize)]
pub struct QueryRequest {
    pub shape: LdfKind,
    pub tick_spacing: Option<i32>,
    pub rounded_tick: i32,
    pub twap_tick: i32,
    #[serde(default)]
    pub spot_price_tick: i32,
    pub ldf_params: LdfParams,
    #[serde(default)]
    pub ldf_state: LdfState,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QueryResponse {
    pub liquidity_density_x96: String,
    pub cumulative_amount0_density_x96: String,
    pub cumulative_amount1_density_x96: String,
    pub new_ldf_state: LdfState,
    pub should_surge: bool,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        QueryResponse {
            liquidity_density_x96: result.liquidity_density_x96.to_string(),
            cumulative_amount0_density_x96: result.cumulative_amount0_density_x96.to_string(),
            cumulative_amount1_density_x96: result.cumulative_amount1_density_x96.to_string(),
            new_ldf_state: result.new_ldf_state,
            should_surge: result.should_surge,
        }
    }
}

#[derive(Deserialize)]
pub struct SwapRequest {
    pub shape: LdfKind,
    pub tick_spacing: Option<i32>,
    pub inverse_cumulative_amount_input: String,
    pub total_liquidity: String,
    pub zero_for_one: bool,
    pub exact_in: bool,
    pub twap_tick: i32,
    #[serde(default)]
    pub spot_price_tick: i32,
    pub ldf_params: LdfParams,
    #[serde(default)]
    pub ldf_state: LdfState,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SwapResponse {
    pub success: bool,
    pub rounded_tick: i32,
    pub cumulative_amount0: String,
    pub cumulative_amount1: String,
    pub swap_liquidity: String,
}

impl From<SwapResult> for SwapResponse {
    fn from(result: SwapResult) -> Self {
        SwapResponse {
            success: result.success,
            rounded_tick: result.rounded_tick,
            cumulative_amount0: result.cumulative_amount0.to_string(),
            cumulative_amount1: result.cumulative_amount1.to_string(),
            swap_liquidity: result.swap_liquidity.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ShapesResponse {
    pub shapes: Vec<LdfKind>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// Parses a decimal 256-bit amount.
pub fn parse_u256(field: &str, value: &str) -> Result<U256, String> {
    U256::from_dec_str(value.trim()).map_err(|e| format!("{}: {:?}", field, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u256() {
        assert_eq!(parse_u256("amount", "1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_u256("amount", &U256::MAX.to_string()).unwrap(), U256::MAX);
        assert!(parse_u256("amount", "0x10").is_err());
        assert!(parse_u256("amount", "-1").is_err());
    }

    #[test]
    fn test_query_request_defaults() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"shape":"geometric","rounded_tick":0,"twap_tick":0,"ldf_params":"0x03fffda80014055d4a80"}"#,
        )
        .unwrap();
        assert_eq!(request.shape, LdfKind::Geometric);
        assert_eq!(request.tick_spacing, None);
        assert_eq!(request.spot_price_tick, 0);
        assert_eq!(request.ldf_state, LdfState::default());
        assert_eq!(request.ldf_params.i24_at(1), -600);
        assert_eq!(request.ldf_params.i16_at(4), 20);
        assert_eq!(request.ldf_params.u32_at(6), 90_000_000);
    }
}
