use std::sync::Arc;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::bootstrap::AppState;
use crate::error::LdfError;
use crate::ldf::{LdfKind, LiquidityDensityFunction, SwapInput};
use crate::web::dto::{
    parse_u256, ErrorResponse, QueryRequest, QueryResponse, ShapesResponse, SwapRequest, SwapResponse,
};

type ApiResult<T> = Result<Json<T>, Custom<Json<ErrorResponse>>>;

fn reject(status: Status, error: String) -> Custom<Json<ErrorResponse>> {
    Custom(status, Json(ErrorResponse { error }))
}

fn engine_error(e: LdfError) -> Custom<Json<ErrorResponse>> {
    let status = match e {
        LdfError::InvalidParams(_)
        | LdfError::InvalidShiftMode(_)
        | LdfError::InvalidTickSpacing(_)
        | LdfError::InvalidTick(_)
        | LdfError::UnknownShape(_) => Status::BadRequest,
        _ => Status::UnprocessableEntity,
    };
    reject(status, e.to_string())
}

fn shape<'a>(
    app_state: &'a AppState,
    kind: LdfKind,
) -> Result<&'a dyn LiquidityDensityFunction, Custom<Json<ErrorResponse>>> {
    app_state
        .registry
        .get(kind)
        .ok_or_else(|| engine_error(LdfError::UnknownShape(kind.to_string())))
}

#[post("/api/v1/ldf/query", format = "json", data = "<request>")]
pub fn query(request: Json<QueryRequest>, app_state: &State<Arc<AppState>>) -> ApiResult<QueryResponse> {
    let request = request.into_inner();
    let tick_spacing = request.tick_spacing.unwrap_or(app_state.default_tick_spacing);
    let ldf = shape(app_state, request.shape)?;

    match ldf.query(
        tick_spacing,
        request.rounded_tick,
        request.twap_tick,
        request.spot_price_tick,
        &request.ldf_params,
        &request.ldf_state,
    ) {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => {
            log::warn!("{} query at tick {} failed: {}", request.shape, request.rounded_tick, e);
            Err(engine_error(e))
        }
    }
}

#[post("/api/v1/ldf/compute-swap", format = "json", data = "<request>")]
pub fn compute_swap(request: Json<SwapRequest>, app_state: &State<Arc<AppState>>) -> ApiResult<SwapResponse> {
    let request = request.into_inner();
    let tick_spacing = request.tick_spacing.unwrap_or(app_state.default_tick_spacing);
    let ldf = shape(app_state, request.shape)?;

    let input = SwapInput {
        inverse_cumulative_amount_input: parse_u256(
            "inverse_cumulative_amount_input",
            &request.inverse_cumulative_amount_input,
        )
        .map_err(|e| reject(Status::BadRequest, e))?,
        total_liquidity: parse_u256("total_liquidity", &request.total_liquidity)
            .map_err(|e| reject(Status::BadRequest, e))?,
        zero_for_one: request.zero_for_one,
        exact_in: request.exact_in,
    };

    match ldf.compute_swap(
        tick_spacing,
        &input,
        request.twap_tick,
        request.spot_price_tick,
        &request.ldf_params,
        &request.ldf_state,
    ) {
        Ok(result) => Ok(Json(result.into())),
        Err(e) => {
            log::warn!("{} swap of {} failed: {}", request.shape, input.inverse_cumulative_amount_input, e);
            Err(engine_error(e))
        }
    }
}

#[get("/api/v1/shapes")]
pub fn shapes(app_state: &State<Arc<AppState>>) -> Json<ShapesResponse> {
    Json(ShapesResponse { shapes: app_state.registry.kinds() })
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
