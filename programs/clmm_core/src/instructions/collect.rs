/// Collect Instruction Module
///
/// Pays out what a personal position is owed: fees and withdrawn principal in both tokens,
/// and accrued liquidity mining rewards. A position that still holds liquidity is refreshed
/// first so fees earned up to now are included.
use crate::constants::REWARD_NUM;
use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::instructions::modify_position;
use crate::position::{PersonalPosition, ProtocolPosition};
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Event recorded when a position collects fees or principal
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesCollected {
    pub pool_id: Pubkey,
    pub position_id: Pubkey,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Brings a position's fees and rewards up to `now`.
fn refresh(tx: &mut PoolTransaction, position: &mut PersonalPosition, now: u64) -> Result<()> {
    if position.liquidity == 0 {
        return Ok(());
    }
    let outcome = modify_position::handler(
        tx,
        position.tick_lower_index,
        position.tick_upper_index,
        0,
        now,
    )?;
    position.accrue(
        outcome.fee_growth_inside_0_x64,
        outcome.fee_growth_inside_1_x64,
        &outcome.reward_growths_inside_x64,
    )
}

/// Withdraws up to the requested amounts of what the position is owed.
///
/// Payouts are capped by both the personal position and the range's protocol position.
///
/// # Returns
/// * `(amount_0, amount_1)` actually collected
pub fn handler(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    amount_0_requested: u64,
    amount_1_requested: u64,
    now: u64,
) -> Result<(u64, u64)> {
    let mut position = tx.personal_position(position_id)?;
    position.ensure_authorized(caller)?;
    refresh(tx, &mut position, now)?;

    let (tick_lower, tick_upper) = (position.tick_lower_index, position.tick_upper_index);
    // A settled range record is gone; the position can only collect nothing then
    let mut protocol_position = tx
        .protocol_position(tick_lower, tick_upper)
        .unwrap_or_else(|| ProtocolPosition::new(tick_lower, tick_upper));

    let amount_0 = amount_0_requested
        .min(position.token_fees_owed_0)
        .min(protocol_position.tokens_owed_0);
    let amount_1 = amount_1_requested
        .min(position.token_fees_owed_1)
        .min(protocol_position.tokens_owed_1);

    position.token_fees_owed_0 -= amount_0;
    position.token_fees_owed_1 -= amount_1;
    protocol_position.tokens_owed_0 -= amount_0;
    protocol_position.tokens_owed_1 -= amount_1;

    msg!(
        "Position {} collected {} / {}",
        position_id,
        amount_0,
        amount_1
    );

    let event = FeesCollected {
        pool_id: tx.pool.pool_id,
        position_id: *position_id,
        amount_0,
        amount_1,
    };
    tx.settle_protocol_position(protocol_position);
    tx.put_personal_position(position);
    tx.emit(PoolEvent::FeesCollected(event));
    Ok((amount_0, amount_1))
}

/// Withdraws everything a position has accrued from one reward slot.
///
/// # Errors
/// * `IndexOutOfRange` if `reward_index >= REWARD_NUM`
/// * `RewardNotInitialized` if the slot was never configured
/// * `UnauthorizedAccess` unless `caller` is the owner or delegate
pub fn collect_reward(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    reward_index: u8,
    now: u64,
) -> Result<u64> {
    require!(
        (reward_index as usize) < REWARD_NUM,
        ErrorCode::IndexOutOfRange
    );
    require!(
        tx.pool.reward_infos.get(reward_index)?.is_some(),
        ErrorCode::RewardNotInitialized
    );

    let mut position = tx.personal_position(position_id)?;
    position.ensure_authorized(caller)?;
    refresh(tx, &mut position, now)?;

    let reward = &mut position.reward_infos[reward_index as usize];
    let amount = reward.reward_amount_owed;
    reward.reward_amount_owed = 0;

    let info = tx.pool.reward_infos.get_mut(reward_index)?;
    info.reward_claimed = info
        .reward_claimed
        .checked_add(amount)
        .ok_or_else(|| error!(ErrorCode::MathOverflow))?;

    msg!(
        "Position {} collected {} of reward {}",
        position_id,
        amount,
        reward_index
    );
    tx.put_personal_position(position);
    Ok(amount)
}

impl PoolStore {
    /// See [`handler`].
    pub fn collect(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        amount_0_requested: u64,
        amount_1_requested: u64,
        now: u64,
    ) -> Result<(u64, u64)> {
        self.transact(|tx| {
            handler(
                tx,
                caller,
                position_id,
                amount_0_requested,
                amount_1_requested,
                now,
            )
        })
    }

    /// See [`collect_reward`].
    pub fn collect_reward(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        reward_index: u8,
        now: u64,
    ) -> Result<u64> {
        self.transact(|tx| collect_reward(tx, caller, position_id, reward_index, now))
    }
}
