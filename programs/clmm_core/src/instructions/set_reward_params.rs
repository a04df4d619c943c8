/// Set Reward Params Instruction Module
use crate::events::PoolEvent;
use crate::instructions::initialize_reward::RewardConfigured;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Changes the emission rate and end time of a live reward schedule.
///
/// Growth under the old rate is settled up to `now` before the new rate applies.
///
/// # Errors
/// * `IndexOutOfRange`, `RewardNotInitialized` for a bad slot
/// * `UnauthorizedAccess` unless `caller` is the slot's authority
/// * `ZeroEmission` for a zero rate
/// * `InvalidWindow` if the schedule already ended or the new end is not in the future
pub fn handler(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    index: u8,
    emissions_per_second_x64: u128,
    end_time: u64,
    now: u64,
) -> Result<()> {
    let liquidity = tx.pool.liquidity;
    tx.pool.reward_infos.update(now, liquidity)?;
    tx.pool
        .reward_infos
        .set_params(index, caller, emissions_per_second_x64, end_time, now)?;

    msg!(
        "Reward {} on {} now {} per second x64 until {}",
        index,
        tx.pool.pool_id,
        emissions_per_second_x64,
        end_time
    );

    let event = RewardConfigured::from_slot(tx, index)?;
    tx.emit(PoolEvent::RewardConfigured(event));
    Ok(())
}

impl PoolStore {
    /// See [`handler`].
    pub fn set_reward_params(
        &mut self,
        caller: &Pubkey,
        index: u8,
        emissions_per_second_x64: u128,
        end_time: u64,
        now: u64,
    ) -> Result<()> {
        self.transact(|tx| handler(tx, caller, index, emissions_per_second_x64, end_time, now))
    }
}
