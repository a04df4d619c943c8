/// Decrease Liquidity Instruction Module
///
/// Burns part or all of a personal position's liquidity. The withdrawn principal is not
/// paid out here; it becomes owed on both the range's protocol position and the personal
/// position, and leaves through `collect` together with the fees.
use crate::errors::ErrorCode;
use crate::instructions::increase_liquidity::LiquidityResult;
use crate::instructions::{check_deadline, modify_position};
use crate::position::ProtocolPosition;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecreaseLiquidityParams {
    /// Liquidity to burn
    pub liquidity: u128,
    /// Least token0 the burn must be worth
    pub amount_0_min: u64,
    /// Least token1 the burn must be worth
    pub amount_1_min: u64,
    pub deadline: Option<u64>,
}

/// # Errors
/// * `UnauthorizedAccess` unless `caller` is the owner or delegate
/// * `DeadlineExceeded` once the deadline has passed
/// * `ZeroAmount` for a zero burn
/// * `PositionLiquidityTooLow` when burning more than the position holds
/// * `SlippageExceeded` if either amount falls below its minimum
pub fn handler(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    params: &DecreaseLiquidityParams,
    now: u64,
) -> Result<LiquidityResult> {
    check_deadline(params.deadline, now)?;
    let mut position = tx.personal_position(position_id)?;
    position.ensure_authorized(caller)?;
    require!(params.liquidity > 0, ErrorCode::ZeroAmount);
    require!(
        params.liquidity <= position.liquidity,
        ErrorCode::PositionLiquidityTooLow
    );

    let (tick_lower, tick_upper) = (position.tick_lower_index, position.tick_upper_index);
    let liquidity_delta = i128::try_from(params.liquidity)
        .map_err(|_| error!(ErrorCode::LiquidityOverflow))?
        .checked_neg()
        .ok_or_else(|| error!(ErrorCode::LiquidityOverflow))?;
    let outcome = modify_position::handler(tx, tick_lower, tick_upper, liquidity_delta, now)?;
    require!(
        outcome.amount_0 >= params.amount_0_min && outcome.amount_1 >= params.amount_1_min,
        ErrorCode::SlippageExceeded
    );

    // Emptied and settled by the burn if it owed nothing
    let mut protocol_position = tx
        .protocol_position(tick_lower, tick_upper)
        .unwrap_or_else(|| ProtocolPosition::new(tick_lower, tick_upper));
    protocol_position.tokens_owed_0 = add_owed(protocol_position.tokens_owed_0, outcome.amount_0)?;
    protocol_position.tokens_owed_1 = add_owed(protocol_position.tokens_owed_1, outcome.amount_1)?;
    tx.settle_protocol_position(protocol_position);

    position.accrue(
        outcome.fee_growth_inside_0_x64,
        outcome.fee_growth_inside_1_x64,
        &outcome.reward_growths_inside_x64,
    )?;
    position.liquidity -= params.liquidity;
    position.token_fees_owed_0 = add_owed(position.token_fees_owed_0, outcome.amount_0)?;
    position.token_fees_owed_1 = add_owed(position.token_fees_owed_1, outcome.amount_1)?;
    msg!(
        "Position {} burned {}: owed {} / {}",
        position_id,
        params.liquidity,
        position.token_fees_owed_0,
        position.token_fees_owed_1
    );
    tx.put_personal_position(position);

    Ok(LiquidityResult {
        liquidity: params.liquidity,
        amount_0: outcome.amount_0,
        amount_1: outcome.amount_1,
    })
}

fn add_owed(owed: u64, amount: u64) -> Result<u64> {
    owed.checked_add(amount)
        .ok_or_else(|| error!(ErrorCode::MathOverflow))
}

impl PoolStore {
    /// See [`handler`].
    pub fn decrease_liquidity(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        params: &DecreaseLiquidityParams,
        now: u64,
    ) -> Result<LiquidityResult> {
        self.transact(|tx| handler(tx, caller, position_id, params, now))
    }
}
