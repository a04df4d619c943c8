//! Liquidity accumulator updates and the liquidity <-> token amount solvers.

use crate::constants::Q64;
use crate::errors::ErrorCode;
use crate::math::full_math::mul_div_rounding_up;
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use anchor_lang::prelude::*;

/// Applies a signed delta to an unsigned liquidity value.
///
/// # Errors
/// * `LiquidityUnderflow` if the result would be negative
/// * `LiquidityOverflow` if the result would exceed `u128::MAX`
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or_else(|| error!(ErrorCode::LiquidityUnderflow))
    } else {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or_else(|| error!(ErrorCode::LiquidityOverflow))
    }
}

/// Liquidity supplied by `amount_0` of token0 over `[sqrt_a, sqrt_b]`.
///
/// `L = amount_0 * (sqrt_a * sqrt_b) / (sqrt_b - sqrt_a)`
pub fn get_liquidity_for_amount_0(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    amount_0: u64,
    round_down: bool,
) -> Result<u128> {
    let (lower, upper) = order(sqrt_price_a_x64, sqrt_price_b_x64);
    require!(upper > lower, ErrorCode::DivisionByZero);
    let intermediate = mul_div_rounding_up(lower, upper, Q64, !round_down)?;
    mul_div_rounding_up(amount_0 as u128, intermediate, upper - lower, !round_down)
}

/// Liquidity supplied by `amount_1` of token1 over `[sqrt_a, sqrt_b]`.
///
/// `L = amount_1 / (sqrt_b - sqrt_a)`
pub fn get_liquidity_for_amount_1(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    amount_1: u64,
    round_down: bool,
) -> Result<u128> {
    let (lower, upper) = order(sqrt_price_a_x64, sqrt_price_b_x64);
    require!(upper > lower, ErrorCode::DivisionByZero);
    mul_div_rounding_up(amount_1 as u128, Q64, upper - lower, !round_down)
}

/// Largest liquidity that `amount_0_max` and `amount_1_max` can both fund at the current
/// price.
///
/// Below the range only token0 binds, above it only token1; inside the range each side is
/// solved independently and the smaller value wins.
pub fn get_liquidity_for_amounts(
    sqrt_price_current_x64: u128,
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    amount_0_max: u64,
    amount_1_max: u64,
    round_down: bool,
) -> Result<u128> {
    let (lower, upper) = order(sqrt_price_a_x64, sqrt_price_b_x64);

    if sqrt_price_current_x64 <= lower {
        get_liquidity_for_amount_0(lower, upper, amount_0_max, round_down)
    } else if sqrt_price_current_x64 < upper {
        let liquidity_0 =
            get_liquidity_for_amount_0(sqrt_price_current_x64, upper, amount_0_max, round_down)?;
        let liquidity_1 =
            get_liquidity_for_amount_1(lower, sqrt_price_current_x64, amount_1_max, round_down)?;
        Ok(liquidity_0.min(liquidity_1))
    } else {
        get_liquidity_for_amount_1(lower, upper, amount_1_max, round_down)
    }
}

/// Token amounts represented by `liquidity` over `[sqrt_a, sqrt_b]` at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_price_current_x64: u128,
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<(u64, u64)> {
    let (lower, upper) = order(sqrt_price_a_x64, sqrt_price_b_x64);

    if sqrt_price_current_x64 <= lower {
        Ok((get_amount_0_delta(lower, upper, liquidity, round_up)?, 0))
    } else if sqrt_price_current_x64 < upper {
        Ok((
            get_amount_0_delta(sqrt_price_current_x64, upper, liquidity, round_up)?,
            get_amount_1_delta(lower, sqrt_price_current_x64, liquidity, round_up)?,
        ))
    } else {
        Ok((0, get_amount_1_delta(lower, upper, liquidity, round_up)?))
    }
}

fn order(a: u128, b: u128) -> (u128, u128) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}
