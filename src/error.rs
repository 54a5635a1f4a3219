use primitive_types::U256;
use thiserror::Error;

/// Failure modes of the LDF engine.
///
/// Infeasible swaps are not errors; they come back as `success = false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LdfError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("mulDiv failed: product overflow or zero denominator")]
    MulDivFailed,
    #[error("fullMulDiv failed: quotient exceeds 256 bits or zero denominator")]
    FullMulDivFailed,
    #[error("division by zero")]
    DivisionByZero,
    #[error("rpow overflow")]
    RpowOverflow,
    #[error("mulWad overflow")]
    MulWadFailed,
    #[error("ln undefined for non-positive input")]
    LnUndefined,
    #[error("sDivWad failed")]
    SDivWadFailed,
    #[error("tick {0} outside [MIN_TICK, MAX_TICK]")]
    InvalidTick(i32),
    #[error("sqrt price {0} outside [MIN_SQRT_PRICE, MAX_SQRT_PRICE)")]
    InvalidSqrtPrice(U256),
    #[error("invalid price or liquidity")]
    InvalidPriceOrLiquidity,
    #[error("sqrt price exceeds 160 bits")]
    PriceOverflow,
    #[error("not enough liquidity to remove amount")]
    InsufficientLiquidity,
    #[error("liquidity does not fit in 128 bits")]
    LiquidityOverflow,
    #[error("invalid tick spacing {0}")]
    InvalidTickSpacing(i32),
    #[error("invalid shift mode tag {0}")]
    InvalidShiftMode(u8),
    #[error("invalid LDF params: {0}")]
    InvalidParams(&'static str),
    #[error("unknown LDF shape: {0}")]
    UnknownShape(String),
}

pub type Result<T> = std::result::Result<T, LdfError>;
