/// Open Position and Increase Liquidity Instruction Module
///
/// Both operations turn a pair of token budgets into liquidity at the pool's current price,
/// mint it on the position's range, and credit it to a personal position. Opening creates
/// the personal position first.
use crate::errors::ErrorCode;
use crate::instructions::{check_deadline, modify_position};
use crate::math::liquidity_math::get_liquidity_for_amounts;
use crate::math::tick_math::get_sqrt_price_at_tick;
use crate::position::PersonalPosition;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use crate::tick::check_ticks;
use anchor_lang::prelude::*;

/// Token budgets and slippage bounds of a liquidity deposit.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IncreaseLiquidityParams {
    /// Most token0 the caller is willing to deposit
    pub amount_0_desired: u64,
    /// Most token1 the caller is willing to deposit
    pub amount_1_desired: u64,
    /// Least token0 that must be deposited
    pub amount_0_min: u64,
    /// Least token1 that must be deposited
    pub amount_1_min: u64,
    pub deadline: Option<u64>,
}

/// Liquidity moved by a deposit or withdrawal and the token amounts it was worth.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiquidityResult {
    pub liquidity: u128,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Creates a personal position and deposits into it.
///
/// # Errors
/// * `AccountAlreadyExists` if `position_id` is taken
/// * any error of [`handler`]
pub fn open_position(
    tx: &mut PoolTransaction,
    owner: Pubkey,
    position_id: Pubkey,
    tick_lower: i32,
    tick_upper: i32,
    params: &IncreaseLiquidityParams,
    now: u64,
) -> Result<LiquidityResult> {
    require!(
        !tx.personal_position_exists(&position_id),
        ErrorCode::AccountAlreadyExists
    );
    let position = PersonalPosition::new(position_id, tx.pool.pool_id, owner, tick_lower, tick_upper)?;
    msg!(
        "Opening position {} for owner {} on [{}, {})",
        position_id,
        owner,
        tick_lower,
        tick_upper
    );
    add_liquidity(tx, position, params, now)
}

/// Deposits into an existing personal position.
///
/// # Errors
/// * `UnauthorizedAccess` unless `caller` is the owner or delegate
/// * `DeadlineExceeded` once the deadline has passed
/// * `ZeroAmount` if the budgets buy no liquidity
/// * `SlippageExceeded` if either amount falls below its minimum
pub fn handler(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    params: &IncreaseLiquidityParams,
    now: u64,
) -> Result<LiquidityResult> {
    let position = tx.personal_position(position_id)?;
    position.ensure_authorized(caller)?;
    add_liquidity(tx, position, params, now)
}

fn add_liquidity(
    tx: &mut PoolTransaction,
    mut position: PersonalPosition,
    params: &IncreaseLiquidityParams,
    now: u64,
) -> Result<LiquidityResult> {
    check_deadline(params.deadline, now)?;
    let (tick_lower, tick_upper) = (position.tick_lower_index, position.tick_upper_index);
    check_ticks(tick_lower, tick_upper, tx.pool.tick_spacing)?;

    let liquidity = get_liquidity_for_amounts(
        tx.pool.sqrt_price_x64,
        get_sqrt_price_at_tick(tick_lower)?,
        get_sqrt_price_at_tick(tick_upper)?,
        params.amount_0_desired,
        params.amount_1_desired,
        true,
    )?;
    require!(liquidity > 0, ErrorCode::ZeroAmount);
    let liquidity_delta =
        i128::try_from(liquidity).map_err(|_| error!(ErrorCode::LiquidityOverflow))?;

    let outcome = modify_position::handler(tx, tick_lower, tick_upper, liquidity_delta, now)?;
    require!(
        outcome.amount_0 >= params.amount_0_min && outcome.amount_1 >= params.amount_1_min,
        ErrorCode::SlippageExceeded
    );

    position.accrue(
        outcome.fee_growth_inside_0_x64,
        outcome.fee_growth_inside_1_x64,
        &outcome.reward_growths_inside_x64,
    )?;
    position.liquidity = position
        .liquidity
        .checked_add(liquidity)
        .ok_or_else(|| error!(ErrorCode::LiquidityOverflow))?;
    tx.put_personal_position(position);

    Ok(LiquidityResult {
        liquidity,
        amount_0: outcome.amount_0,
        amount_1: outcome.amount_1,
    })
}

impl PoolStore {
    /// See [`open_position`].
    pub fn open_position(
        &mut self,
        owner: Pubkey,
        position_id: Pubkey,
        tick_lower: i32,
        tick_upper: i32,
        params: &IncreaseLiquidityParams,
        now: u64,
    ) -> Result<LiquidityResult> {
        self.transact(|tx| {
            open_position(tx, owner, position_id, tick_lower, tick_upper, params, now)
        })
    }

    /// See [`handler`].
    pub fn increase_liquidity(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        params: &IncreaseLiquidityParams,
        now: u64,
    ) -> Result<LiquidityResult> {
        self.transact(|tx| handler(tx, caller, position_id, params, now))
    }
}
