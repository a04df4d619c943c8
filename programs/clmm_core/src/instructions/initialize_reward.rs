/// Initialize Reward Instruction Module
///
/// Opens a liquidity mining schedule in one of the pool's reward slots. Emissions are split
/// across the active liquidity of every second in the window, so a position earns in
/// proportion to the liquidity it keeps in range.
use crate::config::AmmConfig;
use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::reward::InitializeRewardParams;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Event recorded when a reward schedule is opened or changed
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardConfigured {
    pub pool_id: Pubkey,
    pub index: u8,
    pub token_mint: Pubkey,
    /// Who may change the schedule later
    pub authority: Pubkey,
    pub emissions_per_second_x64: u128,
    pub open_time: u64,
    pub end_time: u64,
}

impl RewardConfigured {
    /// Snapshot of slot `index` of the staged pool.
    pub(crate) fn from_slot(tx: &PoolTransaction, index: u8) -> Result<Self> {
        let info = tx
            .pool
            .reward_infos
            .get(index)?
            .ok_or_else(|| error!(ErrorCode::RewardNotInitialized))?;
        Ok(Self {
            pool_id: tx.pool.pool_id,
            index,
            token_mint: info.token_mint,
            authority: info.authority,
            emissions_per_second_x64: info.emissions_per_second_x64,
            open_time: info.open_time,
            end_time: info.end_time,
        })
    }
}

/// Configures reward slot `params.index`, with `funder` as its authority.
///
/// Existing slots are settled up to `now` first so the new schedule starts from a
/// consistent state.
///
/// # Errors
/// * `UnauthorizedAccess` unless `funder` owns the configuration
/// * `IndexOutOfRange`, `InvalidWindow`, `ZeroEmission`, `RewardSlotOccupied` from the slot
pub fn handler(
    tx: &mut PoolTransaction,
    config: &AmmConfig,
    funder: &Pubkey,
    params: &InitializeRewardParams,
    now: u64,
) -> Result<()> {
    require_keys_eq!(config.owner, *funder, ErrorCode::UnauthorizedAccess);

    let liquidity = tx.pool.liquidity;
    tx.pool.reward_infos.update(now, liquidity)?;
    tx.pool.reward_infos.initialize(params, *funder, now)?;

    msg!(
        "Reward {} opened on {}: {} per second x64 from {} to {}",
        params.index,
        tx.pool.pool_id,
        params.emissions_per_second_x64,
        params.open_time,
        params.end_time
    );

    let event = RewardConfigured::from_slot(tx, params.index)?;
    tx.emit(PoolEvent::RewardConfigured(event));
    Ok(())
}

impl PoolStore {
    /// See [`handler`].
    pub fn initialize_reward(
        &mut self,
        config: &AmmConfig,
        funder: &Pubkey,
        params: &InitializeRewardParams,
        now: u64,
    ) -> Result<()> {
        self.transact(|tx| handler(tx, config, funder, params, now))
    }
}
