/// Modify Position Instruction Module
///
/// Adds or removes liquidity on a `[tick_lower, tick_upper)` range of a pool. This is the
/// range-level primitive every personal position operation goes through: it keeps the two
/// boundary ticks, the tick bitmap, the range's protocol position and the pool's active
/// liquidity in step, and reports the token amounts the change is worth.
use crate::constants::REWARD_NUM;
use crate::events::PoolEvent;
use crate::math::liquidity_math::add_delta;
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::tick_math::get_sqrt_price_at_tick;
use crate::oracle::block_timestamp;
use crate::position::ProtocolPosition;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use crate::tick::{
    check_ticks, get_fee_growth_inside, get_reward_growths_inside, max_liquidity_per_tick,
};
use anchor_lang::prelude::*;

/// Event recorded when liquidity is added to or removed from a range
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityChanged {
    pub pool_id: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Positive when minting, negative when burning
    pub liquidity_delta: i128,
    pub amount_0: u64,
    pub amount_1: u64,
    /// The pool's active liquidity after the change
    pub pool_liquidity: u128,
    pub timestamp: u64,
}

/// What a range update produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifyPositionOutcome {
    /// Token0 owed by the caller (mint, rounded up) or to the caller (burn, rounded down)
    pub amount_0: u64,
    /// Token1 owed by the caller (mint, rounded up) or to the caller (burn, rounded down)
    pub amount_1: u64,
    /// Fee growth inside the range after the update
    pub fee_growth_inside_0_x64: u128,
    pub fee_growth_inside_1_x64: u128,
    /// Reward growth inside the range after the update
    pub reward_growths_inside_x64: [u128; REWARD_NUM],
}

/// Applies a liquidity change to a range.
///
/// A zero delta only refreshes the range's fee and reward accounting.
///
/// # Arguments
/// * `tx` - Staged view of the pool
/// * `tick_lower` / `tick_upper` - The range
/// * `liquidity_delta` - Liquidity to add (positive) or remove (negative)
/// * `now` - Current time, for the oracle and reward accrual
///
/// # Errors
/// * `InvalidTickRange`, `TickOutOfRange`, `TickNotAligned` for a bad range
/// * `TickLiquidityLimitExceeded` if a boundary tick would hold too much liquidity
/// * `LiquidityUnderflow` when removing more than the range holds
/// * `ZeroAmount` when refreshing a range without liquidity
pub fn handler(
    tx: &mut PoolTransaction,
    tick_lower: i32,
    tick_upper: i32,
    liquidity_delta: i128,
    now: u64,
) -> Result<ModifyPositionOutcome> {
    check_ticks(tick_lower, tick_upper, tx.pool.tick_spacing)?;

    let liquidity_before = tx.pool.liquidity;
    let reward_growths_global = tx.pool.reward_infos.update(now, liquidity_before)?;

    let mut outcome = update_position(
        tx,
        tick_lower,
        tick_upper,
        liquidity_delta,
        &reward_growths_global,
    )?;

    if liquidity_delta == 0 {
        return Ok(outcome);
    }

    let sqrt_price_lower_x64 = get_sqrt_price_at_tick(tick_lower)?;
    let sqrt_price_upper_x64 = get_sqrt_price_at_tick(tick_upper)?;
    let liquidity = liquidity_delta.unsigned_abs();
    let round_up = liquidity_delta > 0;
    let current_tick = tx.pool.current_tick;
    let sqrt_price_x64 = tx.pool.sqrt_price_x64;

    if current_tick < tick_lower {
        // Range is above the price: only token0
        outcome.amount_0 = get_amount_0_delta(
            sqrt_price_lower_x64,
            sqrt_price_upper_x64,
            liquidity,
            round_up,
        )?;
    } else if current_tick < tick_upper {
        // Active range: the oracle records the liquidity that held until now
        tx.oracle_mut()
            .write(block_timestamp(now)?, current_tick, liquidity_before)?;
        outcome.amount_0 =
            get_amount_0_delta(sqrt_price_x64, sqrt_price_upper_x64, liquidity, round_up)?;
        outcome.amount_1 =
            get_amount_1_delta(sqrt_price_lower_x64, sqrt_price_x64, liquidity, round_up)?;
        tx.pool.liquidity = add_delta(liquidity_before, liquidity_delta)?;
    } else {
        // Range is below the price: only token1
        outcome.amount_1 = get_amount_1_delta(
            sqrt_price_lower_x64,
            sqrt_price_upper_x64,
            liquidity,
            round_up,
        )?;
    }

    msg!(
        "Range [{}, {}) liquidity delta {}: amount_0 {}, amount_1 {}",
        tick_lower,
        tick_upper,
        liquidity_delta,
        outcome.amount_0,
        outcome.amount_1
    );

    let event = LiquidityChanged {
        pool_id: tx.pool.pool_id,
        tick_lower,
        tick_upper,
        liquidity_delta,
        amount_0: outcome.amount_0,
        amount_1: outcome.amount_1,
        pool_liquidity: tx.pool.liquidity,
        timestamp: now,
    };
    tx.emit(PoolEvent::LiquidityChanged(event));

    Ok(outcome)
}

/// Updates both boundary ticks, the bitmap and the protocol position.
fn update_position(
    tx: &mut PoolTransaction,
    tick_lower: i32,
    tick_upper: i32,
    liquidity_delta: i128,
    reward_growths_global: &[u128; REWARD_NUM],
) -> Result<ModifyPositionOutcome> {
    let current_tick = tx.pool.current_tick;
    let fee_growth_global_0_x64 = tx.pool.fee_growth_global_0_x64;
    let fee_growth_global_1_x64 = tx.pool.fee_growth_global_1_x64;

    let mut lower = tx.tick_or_new(tick_lower);
    let mut upper = tx.tick_or_new(tick_upper);

    let mut flipped_lower = false;
    let mut flipped_upper = false;
    if liquidity_delta != 0 {
        let max_liquidity = max_liquidity_per_tick(tx.pool.tick_spacing);
        flipped_lower = lower.update(
            current_tick,
            liquidity_delta,
            fee_growth_global_0_x64,
            fee_growth_global_1_x64,
            reward_growths_global,
            false,
            max_liquidity,
        )?;
        flipped_upper = upper.update(
            current_tick,
            liquidity_delta,
            fee_growth_global_0_x64,
            fee_growth_global_1_x64,
            reward_growths_global,
            true,
            max_liquidity,
        )?;
        if flipped_lower {
            tx.flip_tick(tick_lower)?;
        }
        if flipped_upper {
            tx.flip_tick(tick_upper)?;
        }
    }

    let (fee_growth_inside_0_x64, fee_growth_inside_1_x64) = get_fee_growth_inside(
        &lower,
        &upper,
        current_tick,
        fee_growth_global_0_x64,
        fee_growth_global_1_x64,
    );
    let reward_growths_inside_x64 =
        get_reward_growths_inside(&lower, &upper, current_tick, reward_growths_global);

    let mut protocol_position = tx
        .protocol_position(tick_lower, tick_upper)
        .unwrap_or_else(|| ProtocolPosition::new(tick_lower, tick_upper));
    protocol_position.update(
        liquidity_delta,
        fee_growth_inside_0_x64,
        fee_growth_inside_1_x64,
        reward_growths_inside_x64,
    )?;
    tx.settle_protocol_position(protocol_position);

    if liquidity_delta != 0 {
        for (tick, flipped) in [(lower, flipped_lower), (upper, flipped_upper)] {
            // A tick nobody references any more is deleted
            if liquidity_delta < 0 && flipped {
                tx.remove_tick(tick.tick);
            } else {
                tx.put_tick(tick);
            }
        }
        tx.ensure_bitmap_consistent(tick_lower)?;
        tx.ensure_bitmap_consistent(tick_upper)?;
    }

    Ok(ModifyPositionOutcome {
        fee_growth_inside_0_x64,
        fee_growth_inside_1_x64,
        reward_growths_inside_x64,
        ..Default::default()
    })
}

impl PoolStore {
    /// Range-level mint or burn, see [`handler`].
    pub fn modify_position(
        &mut self,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        now: u64,
    ) -> Result<ModifyPositionOutcome> {
        self.transact(|tx| handler(tx, tick_lower, tick_upper, liquidity_delta, now))
    }
}
