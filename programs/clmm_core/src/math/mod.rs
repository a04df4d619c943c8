pub mod full_math;
pub mod liquidity_math;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use full_math::{mul_div_ceil, mul_div_floor, mul_div_rounding_up};
pub use liquidity_math::{add_delta, get_amounts_for_liquidity, get_liquidity_for_amounts};
pub use sqrt_price_math::{
    get_amount_0_delta, get_amount_1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
pub use swap_math::{compute_swap_step, SwapStep};
pub use tick_math::{get_sqrt_price_at_tick, get_tick_at_sqrt_price};
