// lib.rs - Library exports for the service binary and integration tests

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ldf;
pub mod math;
pub mod web;

pub use error::{LdfError, Result};
pub use ldf::{
    LdfKind, LdfParams, LdfRegistry, LdfState, LiquidityDensityFunction, QueryResult, ShiftMode, SwapInput,
    SwapResult,
};
