/// AMM-wide configuration.
///
/// Holds the values every pool of a deployment shares: who administers the protocol, the
/// share of swap fees diverted to the protocol, which fee tiers pools may be created with,
/// and the ceiling a hosting ledger imposes on accounts touched by one swap.
use crate::constants::{
    DEFAULT_PROTOCOL_FEE_RATE, FEE_RATE_DENOMINATOR, FEE_TIER_HIGH, FEE_TIER_LOW, FEE_TIER_LOWEST,
    FEE_TIER_MEDIUM, MAX_FEE_RATE, MAX_TICK, TICK_SPACING_HIGH, TICK_SPACING_LOW,
    TICK_SPACING_LOWEST, TICK_SPACING_MEDIUM,
};
use crate::errors::ErrorCode;
use anchor_lang::prelude::*;
use std::collections::BTreeMap;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AmmConfig {
    /// Administrator: collects protocol fees and edits this record
    pub owner: Pubkey,
    /// Share of each swap fee kept by the protocol, parts per million
    pub protocol_fee_rate: u32,
    /// Enabled fee tiers, fee rate (ppm) to tick spacing
    pub fee_tiers: BTreeMap<u32, u16>,
    /// Maximum number of bitmap words plus ticks one swap may touch; `None` is unbounded
    pub max_touched_ticks: Option<u16>,
}

impl AmmConfig {
    /// A configuration with the four standard fee tiers and the default protocol share.
    pub fn new(owner: Pubkey) -> Self {
        let fee_tiers = BTreeMap::from([
            (FEE_TIER_LOWEST, TICK_SPACING_LOWEST),
            (FEE_TIER_LOW, TICK_SPACING_LOW),
            (FEE_TIER_MEDIUM, TICK_SPACING_MEDIUM),
            (FEE_TIER_HIGH, TICK_SPACING_HIGH),
        ]);
        Self {
            owner,
            protocol_fee_rate: DEFAULT_PROTOCOL_FEE_RATE,
            fee_tiers,
            max_touched_ticks: None,
        }
    }

    fn ensure_owner(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(self.owner, *caller, ErrorCode::UnauthorizedAccess);
        Ok(())
    }

    /// Enables (or re-spaces) a fee tier.
    ///
    /// # Errors
    /// * `InvalidFeeRate` if the fee is zero or not below the denominator
    /// * `InvalidTickSpacing` if the spacing is zero or wider than the tick range
    pub fn enable_fee_tier(&mut self, caller: &Pubkey, fee_rate: u32, tick_spacing: u16) -> Result<()> {
        self.ensure_owner(caller)?;
        require!(
            fee_rate > 0 && fee_rate <= MAX_FEE_RATE,
            ErrorCode::InvalidFeeRate
        );
        require!(
            tick_spacing > 0 && (tick_spacing as i32) < MAX_TICK,
            ErrorCode::InvalidTickSpacing
        );
        self.fee_tiers.insert(fee_rate, tick_spacing);
        msg!("Fee tier enabled: fee {} spacing {}", fee_rate, tick_spacing);
        Ok(())
    }

    pub fn set_protocol_fee_rate(&mut self, caller: &Pubkey, protocol_fee_rate: u32) -> Result<()> {
        self.ensure_owner(caller)?;
        require!(
            protocol_fee_rate <= FEE_RATE_DENOMINATOR,
            ErrorCode::InvalidProtocolFeeRate
        );
        self.protocol_fee_rate = protocol_fee_rate;
        Ok(())
    }

    pub fn set_owner(&mut self, caller: &Pubkey, new_owner: Pubkey) -> Result<()> {
        self.ensure_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }

    pub fn set_max_touched_ticks(&mut self, caller: &Pubkey, ceiling: Option<u16>) -> Result<()> {
        self.ensure_owner(caller)?;
        self.max_touched_ticks = ceiling;
        Ok(())
    }

    /// The tick spacing of an enabled fee tier.
    ///
    /// # Errors
    /// * `FeeTierNotEnabled` if no tier exists for `fee_rate`
    pub fn tick_spacing_for(&self, fee_rate: u32) -> Result<u16> {
        self.fee_tiers
            .get(&fee_rate)
            .copied()
            .ok_or_else(|| error!(ErrorCode::FeeTierNotEnabled))
    }
}
