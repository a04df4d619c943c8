//! A single bounded swap step.

use crate::constants::FEE_RATE_DENOMINATOR;
use crate::errors::ErrorCode;
use crate::math::full_math::{mul_div_ceil, mul_div_floor, u256_to_u64};
use crate::math::sqrt_price_math::{
    get_amount_0_delta_u256, get_amount_1_delta_u256, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use anchor_lang::prelude::*;
use primitive_types::U256;

/// Result of a swap step
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// The price after swapping the amount in/out, not to exceed the price target
    pub sqrt_price_next_x64: u128,
    /// Input consumed by the step, excluding the fee
    pub amount_in: u64,
    /// Output released by the step
    pub amount_out: u64,
    /// Fee charged on top of `amount_in`
    pub fee_amount: u64,
}

/// Computes the result of swapping some amount in, or amount out, toward a target price.
///
/// The direction is inferred from the prices: `sqrt_price_current_x64 >= sqrt_price_target_x64`
/// swaps token0 for token1. A non-negative `amount_remaining` is an exact input budget
/// (fee included), a negative one is the exact output still wanted.
///
/// When an exact input step cannot reach the target, its whole unspent budget becomes fee so
/// that no fractional unit is stranded.
///
/// # Errors
/// * `InvalidFeeRate` if `fee_rate >= 1_000_000`
/// * `MathOverflow` if an amount does not fit in a `u64`
pub fn compute_swap_step(
    sqrt_price_current_x64: u128,
    sqrt_price_target_x64: u128,
    liquidity: u128,
    amount_remaining: i64,
    fee_rate: u32,
) -> Result<SwapStep> {
    require!(fee_rate < FEE_RATE_DENOMINATOR, ErrorCode::InvalidFeeRate);

    let zero_for_one = sqrt_price_current_x64 >= sqrt_price_target_x64;
    let exact_input = amount_remaining >= 0;
    let amount_remaining_abs = amount_remaining.unsigned_abs();
    let mut step = SwapStep::default();

    let amount_to_target = if exact_input {
        let amount_remaining_less_fee = mul_div_floor(
            amount_remaining_abs as u128,
            (FEE_RATE_DENOMINATOR - fee_rate) as u128,
            FEE_RATE_DENOMINATOR as u128,
        )? as u64;
        let amount_in = if zero_for_one {
            get_amount_0_delta_u256(sqrt_price_target_x64, sqrt_price_current_x64, liquidity, true)?
        } else {
            get_amount_1_delta_u256(sqrt_price_current_x64, sqrt_price_target_x64, liquidity, true)?
        };
        step.sqrt_price_next_x64 = if U256::from(amount_remaining_less_fee) >= amount_in {
            sqrt_price_target_x64
        } else {
            get_next_sqrt_price_from_input(
                sqrt_price_current_x64,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
        amount_in
    } else {
        let amount_out = if zero_for_one {
            get_amount_1_delta_u256(sqrt_price_target_x64, sqrt_price_current_x64, liquidity, false)?
        } else {
            get_amount_0_delta_u256(sqrt_price_current_x64, sqrt_price_target_x64, liquidity, false)?
        };
        step.sqrt_price_next_x64 = if U256::from(amount_remaining_abs) >= amount_out {
            sqrt_price_target_x64
        } else {
            get_next_sqrt_price_from_output(
                sqrt_price_current_x64,
                liquidity,
                amount_remaining_abs,
                zero_for_one,
            )?
        };
        amount_out
    };

    let reached_target = sqrt_price_target_x64 == step.sqrt_price_next_x64;

    // Amounts are recomputed against the price actually reached.
    let (amount_in, amount_out) = if zero_for_one {
        let amount_in = if reached_target && exact_input {
            amount_to_target
        } else {
            get_amount_0_delta_u256(step.sqrt_price_next_x64, sqrt_price_current_x64, liquidity, true)?
        };
        let amount_out = if reached_target && !exact_input {
            amount_to_target
        } else {
            get_amount_1_delta_u256(step.sqrt_price_next_x64, sqrt_price_current_x64, liquidity, false)?
        };
        (amount_in, amount_out)
    } else {
        let amount_in = if reached_target && exact_input {
            amount_to_target
        } else {
            get_amount_1_delta_u256(sqrt_price_current_x64, step.sqrt_price_next_x64, liquidity, true)?
        };
        let amount_out = if reached_target && !exact_input {
            amount_to_target
        } else {
            get_amount_0_delta_u256(sqrt_price_current_x64, step.sqrt_price_next_x64, liquidity, false)?
        };
        (amount_in, amount_out)
    };

    // Never hand out more than an exact output request asked for.
    let amount_out = if !exact_input && amount_out > U256::from(amount_remaining_abs) {
        U256::from(amount_remaining_abs)
    } else {
        amount_out
    };

    step.amount_in = u256_to_u64(amount_in)?;
    step.amount_out = u256_to_u64(amount_out)?;
    step.fee_amount = if exact_input && !reached_target {
        amount_remaining_abs
            .checked_sub(step.amount_in)
            .ok_or_else(|| error!(ErrorCode::MathUnderflow))?
    } else {
        let fee = mul_div_ceil(
            step.amount_in as u128,
            fee_rate as u128,
            (FEE_RATE_DENOMINATOR - fee_rate) as u128,
        )?;
        u64::try_from(fee).map_err(|_| error!(ErrorCode::MathOverflow))?
    };

    Ok(step)
}
