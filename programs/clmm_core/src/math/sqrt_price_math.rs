//! Token amount deltas between two prices, and the next price for a given amount.

use crate::constants::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64, Q64, RESOLUTION};
use crate::errors::ErrorCode;
use crate::math::full_math::{
    div_rounding_up, mul_div_ceil_u256, mul_div_floor_u256, mul_div_rounding_up, u256_to_u128,
    u256_to_u64,
};
use anchor_lang::prelude::*;
use primitive_types::U256;

/// Orders two prices so that the first is the lower one.
fn sorted(sqrt_price_a_x64: u128, sqrt_price_b_x64: u128) -> (u128, u128) {
    if sqrt_price_a_x64 > sqrt_price_b_x64 {
        (sqrt_price_b_x64, sqrt_price_a_x64)
    } else {
        (sqrt_price_a_x64, sqrt_price_b_x64)
    }
}

/// Gets the amount of token0 between two prices at full width.
///
/// `L * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b)`, evaluated as
/// `((L << 64) * (sqrt_b - sqrt_a) / sqrt_b) / sqrt_a` so the multiplication happens before
/// either division.
pub fn get_amount_0_delta_u256(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (sqrt_price_a_x64, sqrt_price_b_x64) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    require!(sqrt_price_a_x64 > 0, ErrorCode::DivisionByZero);

    let numerator_1 = U256::from(liquidity) << RESOLUTION;
    let numerator_2 = U256::from(sqrt_price_b_x64 - sqrt_price_a_x64);

    if round_up {
        div_rounding_up(
            mul_div_ceil_u256(numerator_1, numerator_2, U256::from(sqrt_price_b_x64))?,
            U256::from(sqrt_price_a_x64),
        )
    } else {
        Ok(
            mul_div_floor_u256(numerator_1, numerator_2, U256::from(sqrt_price_b_x64))?
                / U256::from(sqrt_price_a_x64),
        )
    }
}

/// Gets the amount of token1 between two prices at full width: `L * (sqrt_b - sqrt_a)`.
pub fn get_amount_1_delta_u256(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (sqrt_price_a_x64, sqrt_price_b_x64) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    let numerator = U256::from(liquidity) * U256::from(sqrt_price_b_x64 - sqrt_price_a_x64);
    let quotient = numerator >> RESOLUTION;
    if round_up && !(numerator & U256::from(u64::MAX)).is_zero() {
        Ok(quotient + U256::one())
    } else {
        Ok(quotient)
    }
}

/// Gets the token0 amount needed to move `liquidity` between two prices.
///
/// # Arguments
/// * `sqrt_price_a_x64` / `sqrt_price_b_x64` - The two prices, in either order
/// * `liquidity` - The liquidity being moved
/// * `round_up` - Round up for amounts paid in, down for amounts paid out
///
/// # Errors
/// * `MathOverflow` if the amount does not fit in a `u64`
pub fn get_amount_0_delta(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64> {
    u256_to_u64(get_amount_0_delta_u256(
        sqrt_price_a_x64,
        sqrt_price_b_x64,
        liquidity,
        round_up,
    )?)
}

/// Gets the token1 amount needed to move `liquidity` between two prices.
pub fn get_amount_1_delta(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64> {
    u256_to_u64(get_amount_1_delta_u256(
        sqrt_price_a_x64,
        sqrt_price_b_x64,
        liquidity,
        round_up,
    )?)
}

/// Next price after adding or removing `amount` of token0, rounded up.
///
/// `sqrt_p' = L * sqrt_p / (L + amount * sqrt_p)` when adding,
/// `sqrt_p' = L * sqrt_p / (L - amount * sqrt_p)` when removing.
///
/// Rounding up keeps the price from moving further than the amount justifies.
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
    add: bool,
) -> Result<u128> {
    if amount == 0 {
        return Ok(sqrt_price_x64);
    }
    let numerator_1 = U256::from(liquidity) << RESOLUTION;
    let product = U256::from(amount) * U256::from(sqrt_price_x64);

    let denominator = if add {
        numerator_1 + product
    } else {
        require!(numerator_1 > product, ErrorCode::PriceOverflow);
        numerator_1 - product
    };

    let next = mul_div_ceil_u256(numerator_1, U256::from(sqrt_price_x64), denominator)?;
    u256_to_u128(next).map_err(|_| error!(ErrorCode::PriceOverflow))
}

/// Next price after adding or removing `amount` of token1, rounded down.
///
/// `sqrt_p' = sqrt_p + amount / L` when adding, `sqrt_p - amount / L` when removing.
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u64,
    add: bool,
) -> Result<u128> {
    if add {
        let quotient = mul_div_rounding_up(amount as u128, Q64, liquidity, false)?;
        sqrt_price_x64
            .checked_add(quotient)
            .ok_or_else(|| error!(ErrorCode::PriceOverflow))
    } else {
        let quotient = mul_div_rounding_up(amount as u128, Q64, liquidity, true)?;
        require!(sqrt_price_x64 > quotient, ErrorCode::PriceOverflow);
        Ok(sqrt_price_x64 - quotient)
    }
}

/// Fails unless the price is inside the legal range.
fn ensure_within_bounds(sqrt_price_x64: u128) -> Result<u128> {
    require!(
        (MIN_SQRT_PRICE_X64..MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64),
        ErrorCode::PriceOverflow
    );
    Ok(sqrt_price_x64)
}

/// Gets the next price given an input amount of token0 (`zero_for_one`) or token1.
///
/// Rounds so the result never passes the price an exact input could reach.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u64,
    zero_for_one: bool,
) -> Result<u128> {
    require!(sqrt_price_x64 > 0, ErrorCode::PriceOutOfRange);
    require!(liquidity > 0, ErrorCode::DivisionByZero);

    let next = if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x64, liquidity, amount_in, true)?
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x64, liquidity, amount_in, true)?
    };
    ensure_within_bounds(next)
}

/// Gets the next price given an output amount of token1 (`zero_for_one`) or token0.
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_out: u64,
    zero_for_one: bool,
) -> Result<u128> {
    require!(sqrt_price_x64 > 0, ErrorCode::PriceOutOfRange);
    require!(liquidity > 0, ErrorCode::DivisionByZero);

    let next = if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(
            sqrt_price_x64,
            liquidity,
            amount_out,
            false,
        )?
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x64, liquidity, amount_out, false)?
    };
    ensure_within_bounds(next)
}
