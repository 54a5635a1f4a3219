pub mod fixed_point;
pub mod sqrt_price_math;
pub mod tick_math;
