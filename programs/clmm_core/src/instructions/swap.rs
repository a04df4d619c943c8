// Swap Instruction Module
//
// Walks the price curve of a single pool: each step swaps up to the next initialized tick
// (or the price limit), and each initialized tick reached is crossed, which flips its
// outside accumulators and moves its net liquidity in or out of the active set.

use crate::config::AmmConfig;
use crate::constants::{
    FEE_RATE_DENOMINATOR, MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK, Q64,
    REWARD_NUM,
};
use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::instructions::check_deadline;
use crate::math::full_math::mul_div_floor;
use crate::math::liquidity_math::add_delta;
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{get_sqrt_price_at_tick, get_tick_at_sqrt_price};
use crate::oracle::block_timestamp;
use crate::staging::{AccessList, PoolTransaction};
use crate::state::store::PoolStore;
use crate::tick_bitmap::{next_initialized_tick_within_one_word, search_word_position};
use anchor_lang::prelude::*;

/// Event recorded for every executed swap
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExecuted {
    pub pool_id: Pubkey,
    pub zero_for_one: bool,
    /// Token0 paid into (positive) or out of (negative) the pool
    pub amount_0: i64,
    /// Token1 paid into (positive) or out of (negative) the pool
    pub amount_1: i64,
    pub sqrt_price_x64: u128,
    pub liquidity: u128,
    pub tick: i32,
    /// Total fee charged on the input token, protocol share included
    pub fee_amount: u64,
    pub timestamp: u64,
}

/// A swap request against one pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapParams {
    /// True to sell token0 for token1 (price moves down)
    pub zero_for_one: bool,
    /// Exact input when positive, exact output when negative
    pub amount_specified: i64,
    /// The price the swap may not move past
    pub sqrt_price_limit_x64: u128,
    /// Minimum output for exact input, maximum input for exact output
    pub other_amount_threshold: u64,
    pub deadline: Option<u64>,
    pub now: u64,
}

/// Result of a swap operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapResult {
    /// Token0 paid into (positive) or out of (negative) the pool
    pub amount_0: i64,
    /// Token1 paid into (positive) or out of (negative) the pool
    pub amount_1: i64,
    /// New sqrt price after the swap
    pub sqrt_price_x64: u128,
    /// New tick after the swap
    pub tick: i32,
    /// Active liquidity after the swap
    pub liquidity: u128,
    /// Fee charged on the input token, protocol share included
    pub fee_amount: u64,
    /// Share of `fee_amount` kept by the protocol
    pub protocol_fee: u64,
    /// Number of initialized ticks crossed
    pub ticks_crossed: u32,
}

impl SwapResult {
    /// Amount the pool received.
    pub fn amount_in(&self, zero_for_one: bool) -> u64 {
        if zero_for_one {
            self.amount_0.unsigned_abs()
        } else {
            self.amount_1.unsigned_abs()
        }
    }

    /// Amount the pool paid out.
    pub fn amount_out(&self, zero_for_one: bool) -> u64 {
        if zero_for_one {
            self.amount_1.unsigned_abs()
        } else {
            self.amount_0.unsigned_abs()
        }
    }
}

/// Contains state during the swap execution
struct SwapState {
    /// Input still to be spent (exact input) or output still wanted (exact output, negative)
    amount_specified_remaining: i64,
    /// Output received so far (exact input, negative) or input owed (exact output)
    amount_calculated: i64,
    sqrt_price_x64: u128,
    tick: i32,
    liquidity: u128,
    /// Fee growth global of the input token, including this swap's fees so far
    fee_growth_global_x64: u128,
    fee_amount: u64,
    protocol_fee: u64,
    ticks_crossed: u32,
}

/// Validates the price limit against the swap direction.
fn check_price_limit(zero_for_one: bool, sqrt_price_x64: u128, limit_x64: u128) -> Result<()> {
    if zero_for_one {
        require!(
            limit_x64 < sqrt_price_x64 && limit_x64 > MIN_SQRT_PRICE_X64,
            ErrorCode::InvalidPriceLimit
        );
    } else {
        require!(
            limit_x64 > sqrt_price_x64 && limit_x64 < MAX_SQRT_PRICE_X64,
            ErrorCode::InvalidPriceLimit
        );
    }
    Ok(())
}

fn to_i64(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| error!(ErrorCode::MathOverflow))
}

/// Executes a swap, potentially crossing multiple tick boundaries.
///
/// # Arguments
/// * `tx` - Staged view of the pool
/// * `config` - Supplies the protocol fee share and the touched-account ceiling
/// * `params` - The request
///
/// # Errors
/// * `ZeroAmount` if `amount_specified` is zero
/// * `DeadlineExceeded` once the deadline has passed
/// * `InvalidPriceLimit` for a limit on the wrong side of the price or outside the bounds
/// * `TooManyTouchedAccounts` if the walk outgrows `config.max_touched_ticks`
/// * `BitmapMismatch` if the bitmap marks a tick that has no record
/// * `SlippageExceeded` if the result misses `other_amount_threshold`
pub fn handler(
    tx: &mut PoolTransaction,
    config: &AmmConfig,
    params: &SwapParams,
) -> Result<SwapResult> {
    require!(params.amount_specified != 0, ErrorCode::ZeroAmount);
    check_deadline(params.deadline, params.now)?;

    let zero_for_one = params.zero_for_one;
    let exact_input = params.amount_specified > 0;
    let sqrt_price_limit_x64 = params.sqrt_price_limit_x64;
    check_price_limit(zero_for_one, tx.pool.sqrt_price_x64, sqrt_price_limit_x64)?;

    let tick_spacing = tx.pool.tick_spacing;
    let fee_rate = tx.pool.fee_rate;
    let tick_start = tx.pool.current_tick;
    let liquidity_start = tx.pool.liquidity;
    let reward_growths_global: [u128; REWARD_NUM] =
        tx.pool.reward_infos.update(params.now, liquidity_start)?;

    let mut state = SwapState {
        amount_specified_remaining: params.amount_specified,
        amount_calculated: 0,
        sqrt_price_x64: tx.pool.sqrt_price_x64,
        tick: tick_start,
        liquidity: liquidity_start,
        fee_growth_global_x64: if zero_for_one {
            tx.pool.fee_growth_global_0_x64
        } else {
            tx.pool.fee_growth_global_1_x64
        },
        fee_amount: 0,
        protocol_fee: 0,
        ticks_crossed: 0,
    };

    while state.amount_specified_remaining != 0
        && state.sqrt_price_x64 != sqrt_price_limit_x64
        && (MIN_TICK..=MAX_TICK).contains(&state.tick)
    {
        let sqrt_price_start_x64 = state.sqrt_price_x64;

        let word_pos = search_word_position(state.tick, tick_spacing, zero_for_one)?;
        tx.touch_bitmap_word(word_pos);
        tx.ensure_access_within(config.max_touched_ticks)?;
        let word = tx.bitmap_word(word_pos);
        let (mut tick_next, initialized) =
            next_initialized_tick_within_one_word(&word, state.tick, tick_spacing, zero_for_one)?;
        tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next_x64 = get_sqrt_price_at_tick(tick_next)?;

        let sqrt_price_target_x64 = if (zero_for_one && sqrt_price_next_x64 < sqrt_price_limit_x64)
            || (!zero_for_one && sqrt_price_next_x64 > sqrt_price_limit_x64)
        {
            sqrt_price_limit_x64
        } else {
            sqrt_price_next_x64
        };

        let step = compute_swap_step(
            state.sqrt_price_x64,
            sqrt_price_target_x64,
            state.liquidity,
            state.amount_specified_remaining,
            fee_rate,
        )?;
        state.sqrt_price_x64 = step.sqrt_price_next_x64;

        let amount_in_with_fee = to_i64(
            step.amount_in
                .checked_add(step.fee_amount)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?,
        )?;
        let amount_out = to_i64(step.amount_out)?;
        if exact_input {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_sub(amount_in_with_fee)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
            state.amount_calculated = state
                .amount_calculated
                .checked_sub(amount_out)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        } else {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_add(amount_out)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
            state.amount_calculated = state
                .amount_calculated
                .checked_add(amount_in_with_fee)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        }

        // The protocol share is truncated per step; liquidity providers get the rest
        let protocol_fee = (step.fee_amount as u128 * config.protocol_fee_rate as u128
            / FEE_RATE_DENOMINATOR as u128) as u64;
        let lp_fee = step.fee_amount - protocol_fee;
        state.fee_amount = state
            .fee_amount
            .checked_add(step.fee_amount)
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        state.protocol_fee = state
            .protocol_fee
            .checked_add(protocol_fee)
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        if state.liquidity > 0 {
            let growth = mul_div_floor(lp_fee as u128, Q64, state.liquidity)?;
            state.fee_growth_global_x64 = state
                .fee_growth_global_x64
                .checked_add(growth)
                .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        }

        if state.sqrt_price_x64 == sqrt_price_next_x64 {
            if initialized {
                let mut tick_state = tx
                    .tick(tick_next)
                    .ok_or_else(|| error!(ErrorCode::BitmapMismatch))?;
                tx.touch_tick(tick_next);
                tx.ensure_access_within(config.max_touched_ticks)?;

                let (fee_growth_global_0_x64, fee_growth_global_1_x64) = if zero_for_one {
                    (state.fee_growth_global_x64, tx.pool.fee_growth_global_1_x64)
                } else {
                    (tx.pool.fee_growth_global_0_x64, state.fee_growth_global_x64)
                };
                let mut liquidity_net = tick_state.cross(
                    fee_growth_global_0_x64,
                    fee_growth_global_1_x64,
                    &reward_growths_global,
                );
                if zero_for_one {
                    liquidity_net = liquidity_net
                        .checked_neg()
                        .ok_or_else(|| error!(ErrorCode::LiquidityOverflow))?;
                }
                state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                state.ticks_crossed += 1;
                tx.put_tick(tick_state);
            }
            state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if state.sqrt_price_x64 != sqrt_price_start_x64 {
            state.tick = get_tick_at_sqrt_price(state.sqrt_price_x64)?;
        }
    }

    if state.tick != tick_start {
        tx.oracle_mut()
            .write(block_timestamp(params.now)?, tick_start, liquidity_start)?;
    }

    tx.pool.sqrt_price_x64 = state.sqrt_price_x64;
    tx.pool.current_tick = state.tick;
    tx.pool.liquidity = state.liquidity;
    if zero_for_one {
        tx.pool.fee_growth_global_0_x64 = state.fee_growth_global_x64;
    } else {
        tx.pool.fee_growth_global_1_x64 = state.fee_growth_global_x64;
    }
    tx.pool.add_protocol_fees(zero_for_one, state.protocol_fee)?;

    let amount_specified_used = params
        .amount_specified
        .checked_sub(state.amount_specified_remaining)
        .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
    let (amount_0, amount_1) = if zero_for_one == exact_input {
        (amount_specified_used, state.amount_calculated)
    } else {
        (state.amount_calculated, amount_specified_used)
    };

    let result = SwapResult {
        amount_0,
        amount_1,
        sqrt_price_x64: state.sqrt_price_x64,
        tick: state.tick,
        liquidity: state.liquidity,
        fee_amount: state.fee_amount,
        protocol_fee: state.protocol_fee,
        ticks_crossed: state.ticks_crossed,
    };

    if exact_input {
        require!(
            result.amount_out(zero_for_one) >= params.other_amount_threshold,
            ErrorCode::SlippageExceeded
        );
    } else {
        require!(
            result.amount_in(zero_for_one) <= params.other_amount_threshold,
            ErrorCode::SlippageExceeded
        );
    }

    msg!(
        "Swap on {}: amount_0 {}, amount_1 {}, price {} tick {} liquidity {}, {} ticks crossed",
        tx.pool.pool_id,
        amount_0,
        amount_1,
        state.sqrt_price_x64,
        state.tick,
        state.liquidity,
        state.ticks_crossed
    );

    let event = SwapExecuted {
        pool_id: tx.pool.pool_id,
        zero_for_one,
        amount_0,
        amount_1,
        sqrt_price_x64: state.sqrt_price_x64,
        liquidity: state.liquidity,
        tick: state.tick,
        fee_amount: state.fee_amount,
        timestamp: params.now,
    };
    tx.emit(PoolEvent::SwapExecuted(event));

    Ok(result)
}

impl PoolStore {
    /// See [`handler`].
    pub fn swap(&mut self, config: &AmmConfig, params: &SwapParams) -> Result<SwapResult> {
        self.transact(|tx| handler(tx, config, params))
    }

    /// Runs a swap without committing it, returning the result and the records it touched.
    ///
    /// Used by clients to quote and to build the access list a ledger transaction needs.
    pub fn quote_swap(
        &self,
        config: &AmmConfig,
        params: &SwapParams,
    ) -> Result<(SwapResult, AccessList)> {
        let mut tx = PoolTransaction::new(self);
        let result = handler(&mut tx, config, params)?;
        Ok((result, tx.commit().access_list))
    }
}
