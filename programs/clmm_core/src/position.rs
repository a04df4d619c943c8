/// Defines the state for liquidity positions.
///
/// Liquidity is tracked at two levels. A [`ProtocolPosition`] aggregates every personal
/// position sharing the same `[tick_lower, tick_upper)` range: it is what the pool's ticks
/// and fee growth accounting see. A [`PersonalPosition`] is the owner-facing record with its
/// own liquidity share, fee and reward snapshots, and an optional delegate.
use anchor_lang::prelude::*;

use crate::constants::{Q64, REWARD_NUM};
use crate::errors::ErrorCode;
use crate::math::full_math::mul_div_floor;
use crate::math::liquidity_math::add_delta;

/// Tokens earned by `liquidity` while the growth accumulator moved from `last` to `current`.
///
/// The accumulators are modular, so the difference is taken with wrapping arithmetic.
pub fn growth_to_amount(current_x64: u128, last_x64: u128, liquidity: u128) -> Result<u64> {
    let earned = mul_div_floor(current_x64.wrapping_sub(last_x64), liquidity, Q64)?;
    u64::try_from(earned).map_err(|_| error!(ErrorCode::MathOverflow))
}

fn add_owed(owed: u64, delta: u64) -> Result<u64> {
    owed.checked_add(delta)
        .ok_or_else(|| error!(ErrorCode::MathOverflow))
}

/// Aggregate liquidity of a single range of a pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProtocolPosition {
    /// The lower tick boundary of the range
    pub tick_lower_index: i32,
    /// The upper tick boundary of the range
    pub tick_upper_index: i32,
    /// Sum of the liquidity of every personal position over this range
    pub liquidity: u128,
    /// Token0 fee growth inside the range as of the last update
    pub fee_growth_inside_0_last_x64: u128,
    /// Token1 fee growth inside the range as of the last update
    pub fee_growth_inside_1_last_x64: u128,
    /// Token0 owed to this range: accrued fees plus burned principal
    pub tokens_owed_0: u64,
    /// Token1 owed to this range: accrued fees plus burned principal
    pub tokens_owed_1: u64,
    /// Reward growth inside the range as of the last update
    pub reward_growth_inside_last_x64: [u128; REWARD_NUM],
}

impl ProtocolPosition {
    pub fn new(tick_lower_index: i32, tick_upper_index: i32) -> Self {
        Self {
            tick_lower_index,
            tick_upper_index,
            ..Default::default()
        }
    }

    /// Credits fees earned since the last update and applies a liquidity change.
    ///
    /// # Arguments
    /// * `liquidity_delta` - Signed change in the range's liquidity; zero only refreshes fees
    /// * `fee_growth_inside_0_x64` / `fee_growth_inside_1_x64` - Current fee growth inside
    /// * `reward_growths_inside_x64` - Current reward growth inside, per slot
    ///
    /// # Errors
    /// * `ZeroAmount` when refreshing a range that holds no liquidity
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside_0_x64: u128,
        fee_growth_inside_1_x64: u128,
        reward_growths_inside_x64: [u128; REWARD_NUM],
    ) -> Result<()> {
        let liquidity_next = if liquidity_delta == 0 {
            require!(self.liquidity > 0, ErrorCode::ZeroAmount);
            self.liquidity
        } else {
            add_delta(self.liquidity, liquidity_delta)?
        };

        let owed_0 = growth_to_amount(
            fee_growth_inside_0_x64,
            self.fee_growth_inside_0_last_x64,
            self.liquidity,
        )?;
        let owed_1 = growth_to_amount(
            fee_growth_inside_1_x64,
            self.fee_growth_inside_1_last_x64,
            self.liquidity,
        )?;

        self.liquidity = liquidity_next;
        self.fee_growth_inside_0_last_x64 = fee_growth_inside_0_x64;
        self.fee_growth_inside_1_last_x64 = fee_growth_inside_1_x64;
        self.reward_growth_inside_last_x64 = reward_growths_inside_x64;
        self.tokens_owed_0 = add_owed(self.tokens_owed_0, owed_0)?;
        self.tokens_owed_1 = add_owed(self.tokens_owed_1, owed_1)?;
        Ok(())
    }

    /// Whether nothing is left in the range.
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed_0 == 0 && self.tokens_owed_1 == 0
    }
}

/// Per-slot reward accounting of a personal position.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionRewardInfo {
    /// Reward growth inside the range at the last accrual
    pub growth_inside_last_x64: u128,
    /// Reward tokens accrued but not yet collected
    pub reward_amount_owed: u64,
}

/// Owner-facing liquidity position.
///
/// Identified by `position_id`, it belongs to exactly one pool and one range, and is
/// removed only once it holds no liquidity, fees or rewards.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonalPosition {
    /// Stable identifier of the position
    pub position_id: Pubkey,
    /// The pool this position belongs to
    pub pool_id: Pubkey,
    /// The account allowed to manage the position
    pub owner: Pubkey,
    /// An optional second account allowed to manage the position
    pub delegate: Option<Pubkey>,
    /// The lower tick boundary of this position. Liquidity is active when the
    /// pool's current tick is at or above this value.
    pub tick_lower_index: i32,
    /// The upper tick boundary of this position. Liquidity is active when the
    /// pool's current tick is below this value.
    pub tick_upper_index: i32,
    /// The amount of liquidity provided by this position
    pub liquidity: u128,
    /// Snapshot of the range's token0 fee growth at the last accrual
    pub fee_growth_inside_0_last_x64: u128,
    /// Snapshot of the range's token1 fee growth at the last accrual
    pub fee_growth_inside_1_last_x64: u128,
    /// Token0 owed to the owner
    pub token_fees_owed_0: u64,
    /// Token1 owed to the owner
    pub token_fees_owed_1: u64,
    /// Reward accounting per slot
    pub reward_infos: [PositionRewardInfo; REWARD_NUM],
}

impl PersonalPosition {
    /// Creates an empty position over a validated range.
    ///
    /// # Arguments
    /// * `position_id` - Identifier chosen by the caller
    /// * `pool_id` - The pool this position is for
    /// * `owner` - The public key of the position's owner
    /// * `tick_lower_index` / `tick_upper_index` - The position's range
    pub fn new(
        position_id: Pubkey,
        pool_id: Pubkey,
        owner: Pubkey,
        tick_lower_index: i32,
        tick_upper_index: i32,
    ) -> Result<Self> {
        if tick_lower_index >= tick_upper_index {
            return err!(ErrorCode::InvalidTickRange);
        }
        Ok(Self {
            position_id,
            pool_id,
            owner,
            tick_lower_index,
            tick_upper_index,
            ..Default::default()
        })
    }

    /// Whether `caller` may manage this position.
    pub fn is_authorized(&self, caller: &Pubkey) -> bool {
        self.owner == *caller || self.delegate.as_ref() == Some(caller)
    }

    pub fn ensure_authorized(&self, caller: &Pubkey) -> Result<()> {
        require!(self.is_authorized(caller), ErrorCode::UnauthorizedAccess);
        Ok(())
    }

    /// Sets or clears the delegate. Only the owner may do this.
    pub fn approve(&mut self, caller: &Pubkey, delegate: Option<Pubkey>) -> Result<()> {
        require_keys_eq!(self.owner, *caller, ErrorCode::UnauthorizedAccess);
        self.delegate = delegate;
        Ok(())
    }

    /// Hands the position to a new owner, clearing any delegate.
    pub fn transfer(&mut self, caller: &Pubkey, new_owner: Pubkey) -> Result<()> {
        require_keys_eq!(self.owner, *caller, ErrorCode::UnauthorizedAccess);
        self.owner = new_owner;
        self.delegate = None;
        Ok(())
    }

    /// Brings fees and rewards up to date against the range's latest snapshots.
    ///
    /// Uses the liquidity the position held over the elapsed interval, so call it before
    /// changing `liquidity`.
    pub fn accrue(
        &mut self,
        fee_growth_inside_0_x64: u128,
        fee_growth_inside_1_x64: u128,
        reward_growths_inside_x64: &[u128; REWARD_NUM],
    ) -> Result<()> {
        let fees_0 = growth_to_amount(
            fee_growth_inside_0_x64,
            self.fee_growth_inside_0_last_x64,
            self.liquidity,
        )?;
        let fees_1 = growth_to_amount(
            fee_growth_inside_1_x64,
            self.fee_growth_inside_1_last_x64,
            self.liquidity,
        )?;
        self.token_fees_owed_0 = add_owed(self.token_fees_owed_0, fees_0)?;
        self.token_fees_owed_1 = add_owed(self.token_fees_owed_1, fees_1)?;
        self.fee_growth_inside_0_last_x64 = fee_growth_inside_0_x64;
        self.fee_growth_inside_1_last_x64 = fee_growth_inside_1_x64;

        for (info, inside) in self
            .reward_infos
            .iter_mut()
            .zip(reward_growths_inside_x64.iter())
        {
            let earned = growth_to_amount(*inside, info.growth_inside_last_x64, self.liquidity)?;
            info.reward_amount_owed = add_owed(info.reward_amount_owed, earned)?;
            info.growth_inside_last_x64 = *inside;
        }
        Ok(())
    }

    /// Whether the position can be closed.
    pub fn is_cleared(&self) -> bool {
        self.liquidity == 0
            && self.token_fees_owed_0 == 0
            && self.token_fees_owed_1 == 0
            && self.reward_infos.iter().all(|r| r.reward_amount_owed == 0)
    }
}
