//! Liquidity mining reward streams.
//!
//! A pool carries up to [`REWARD_NUM`] independent emission schedules. Each one emits a fixed
//! number of tokens per second between `open_time` and `end_time`, shared pro-rata by the
//! liquidity that is in range while it emits. Accrual mirrors fee growth: a global per-unit
//! accumulator, outside snapshots on ticks and inside snapshots on positions.

use crate::constants::REWARD_NUM;
use crate::errors::ErrorCode;
use anchor_lang::prelude::*;
use primitive_types::U256;

/// Tokens `emissions_per_second_x64` emits over `[from, to)`, rounded down.
///
/// Saturates at `u64::MAX`.
pub fn scheduled_emission(emissions_per_second_x64: u128, from: u64, to: u64) -> u64 {
    let elapsed = to.saturating_sub(from);
    let emitted = (U256::from(emissions_per_second_x64) * U256::from(elapsed)) >> 64;
    if emitted > U256::from(u64::MAX) {
        u64::MAX
    } else {
        emitted.as_u64()
    }
}

/// Lifecycle phase of a configured reward slot.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardState {
    /// Configured, emission has not started yet
    Pending,
    /// Emitting
    Active,
    /// The window is over
    Ended,
}

/// Configuration and accumulator of one emission schedule.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardInfo {
    /// Mint of the reward token
    pub token_mint: Pubkey,
    /// Vault the custody collaborator pays rewards from
    pub token_vault: Pubkey,
    /// Account allowed to change the schedule
    pub authority: Pubkey,
    /// Tokens emitted per second, Q64.64
    pub emissions_per_second_x64: u128,
    pub open_time: u64,
    pub end_time: u64,
    /// Time up to which `reward_growth_global_x64` has been accrued
    pub last_update_time: u64,
    /// Reward per unit of in-range liquidity since the slot was configured, Q64.64
    pub reward_growth_global_x64: u128,
    /// Tokens emitted so far, rounded down
    pub reward_total_emissioned: u64,
    /// Tokens the schedule is funded for: what was emitted before the current rate plus the
    /// rest of the window at that rate. Emission never exceeds it.
    pub reward_total_funded: u64,
    /// Tokens paid out to positions so far
    pub reward_claimed: u64,
}

impl RewardInfo {
    pub fn state(&self, now: u64) -> RewardState {
        if now < self.open_time {
            RewardState::Pending
        } else if now < self.end_time {
            RewardState::Active
        } else {
            RewardState::Ended
        }
    }

    /// Accrues emission over the part of `[last_update_time, now]` that overlaps the window.
    ///
    /// With no in-range liquidity nothing is accrued, but time still advances, so emission
    /// during that gap is forfeited rather than paid to whoever enters later.
    ///
    /// Accrual never fails: growth is a modular accumulator like fee growth, and the emitted
    /// total stops at `reward_total_funded`.
    pub fn accrue(&mut self, now: u64, liquidity: u128) -> Result<()> {
        if now <= self.last_update_time {
            return Ok(());
        }
        let start = self.last_update_time.max(self.open_time);
        let end = now.min(self.end_time);
        if end > start && liquidity > 0 {
            let elapsed = U256::from(end - start);
            // Below 2^192, so the product cannot overflow 256 bits
            let growth_delta =
                U256::from(self.emissions_per_second_x64) * elapsed / U256::from(liquidity);
            self.reward_growth_global_x64 = self
                .reward_growth_global_x64
                .wrapping_add(growth_delta.low_u128());

            let unfunded = self
                .reward_total_funded
                .saturating_sub(self.reward_total_emissioned);
            let emitted = scheduled_emission(self.emissions_per_second_x64, start, end);
            self.reward_total_emissioned += emitted.min(unfunded);
        }
        self.last_update_time = now;
        Ok(())
    }
}

/// Parameters of a new emission schedule.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitializeRewardParams {
    pub index: u8,
    pub token_mint: Pubkey,
    pub token_vault: Pubkey,
    pub open_time: u64,
    pub end_time: u64,
    pub emissions_per_second_x64: u128,
}

/// The reward slots of a pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardSlots(pub [Option<RewardInfo>; REWARD_NUM]);

impl RewardSlots {
    pub fn get(&self, index: u8) -> Result<Option<&RewardInfo>> {
        self.0
            .get(index as usize)
            .map(Option::as_ref)
            .ok_or_else(|| error!(ErrorCode::IndexOutOfRange))
    }

    pub fn get_mut(&mut self, index: u8) -> Result<&mut RewardInfo> {
        self.0
            .get_mut(index as usize)
            .ok_or_else(|| error!(ErrorCode::IndexOutOfRange))?
            .as_mut()
            .ok_or_else(|| error!(ErrorCode::RewardNotInitialized))
    }

    /// Accrues every configured slot up to `now` and returns the global growth per slot.
    ///
    /// Unconfigured slots report zero growth.
    pub fn update(&mut self, now: u64, liquidity: u128) -> Result<[u128; REWARD_NUM]> {
        let mut growths = [0u128; REWARD_NUM];
        for (slot, growth) in self.0.iter_mut().zip(growths.iter_mut()) {
            if let Some(info) = slot {
                info.accrue(now, liquidity)?;
                *growth = info.reward_growth_global_x64;
            }
        }
        Ok(growths)
    }

    pub fn growths_global(&self) -> [u128; REWARD_NUM] {
        let mut growths = [0u128; REWARD_NUM];
        for (slot, growth) in self.0.iter().zip(growths.iter_mut()) {
            if let Some(info) = slot {
                *growth = info.reward_growth_global_x64;
            }
        }
        growths
    }

    /// Configures a slot with a new schedule owned by `authority`.
    ///
    /// Slots are never reused: ticks and positions keep growth snapshots per slot index,
    /// and a fresh accumulator would not line up with them.
    ///
    /// # Errors
    /// * `IndexOutOfRange` if `index >= REWARD_NUM`
    /// * `InvalidWindow` if `open_time >= end_time` or `end_time <= now`
    /// * `ZeroEmission` if the emission rate is zero
    /// * `RewardSlotOccupied` if the slot was already configured
    pub fn initialize(
        &mut self,
        params: &InitializeRewardParams,
        authority: Pubkey,
        now: u64,
    ) -> Result<()> {
        let slot = self
            .0
            .get_mut(params.index as usize)
            .ok_or_else(|| error!(ErrorCode::IndexOutOfRange))?;
        require!(params.open_time < params.end_time, ErrorCode::InvalidWindow);
        require!(params.end_time > now, ErrorCode::InvalidWindow);
        require!(params.emissions_per_second_x64 > 0, ErrorCode::ZeroEmission);
        require!(slot.is_none(), ErrorCode::RewardSlotOccupied);

        *slot = Some(RewardInfo {
            token_mint: params.token_mint,
            token_vault: params.token_vault,
            authority,
            emissions_per_second_x64: params.emissions_per_second_x64,
            open_time: params.open_time,
            end_time: params.end_time,
            last_update_time: now.max(params.open_time),
            reward_total_funded: scheduled_emission(
                params.emissions_per_second_x64,
                now.max(params.open_time),
                params.end_time,
            ),
            ..Default::default()
        });
        Ok(())
    }

    /// Changes the rate and end of a live schedule.
    ///
    /// Must be called after [`RewardSlots::update`] so the old rate is settled up to `now`.
    pub fn set_params(
        &mut self,
        index: u8,
        caller: &Pubkey,
        emissions_per_second_x64: u128,
        end_time: u64,
        now: u64,
    ) -> Result<()> {
        let info = self.get_mut(index)?;
        require_keys_eq!(info.authority, *caller, ErrorCode::UnauthorizedAccess);
        require!(emissions_per_second_x64 > 0, ErrorCode::ZeroEmission);
        require!(end_time > now, ErrorCode::InvalidWindow);
        require!(end_time > info.open_time, ErrorCode::InvalidWindow);
        require!(
            info.state(now) != RewardState::Ended,
            ErrorCode::InvalidWindow
        );
        info.emissions_per_second_x64 = emissions_per_second_x64;
        info.end_time = end_time;
        info.reward_total_funded = info.reward_total_emissioned.saturating_add(scheduled_emission(
            emissions_per_second_x64,
            info.last_update_time.max(info.open_time),
            end_time,
        ));
        Ok(())
    }
}
