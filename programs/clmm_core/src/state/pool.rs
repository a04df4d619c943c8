use crate::constants::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use crate::errors::ErrorCode;
use crate::math::tick_math::get_tick_at_sqrt_price;
use crate::reward::RewardSlots;
use anchor_lang::prelude::*;

/// Defines the state for a liquidity pool.
///
/// A pool trades one ordered token pair at one fee rate. It tracks the current price and
/// the liquidity active at that price, and the growth accumulators that let ranges compute
/// their earnings lazily.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pool {
    /// Address of this pool in the storage collaborator.
    pub pool_id: Pubkey,
    /// The mint address of the first token (token0). Always below `token1_mint`.
    pub token0_mint: Pubkey,
    /// The mint address of the second token (token1).
    pub token1_mint: Pubkey,
    /// The vault holding token0 for this pool.
    pub token0_vault: Pubkey,
    /// The vault holding token1 for this pool.
    pub token1_vault: Pubkey,
    /// Swap fee in parts per million.
    pub fee_rate: u32,
    /// The spacing between usable ticks.
    pub tick_spacing: u16,
    /// The current square root of the price, Q64.64.
    pub sqrt_price_x64: u128,
    /// The current tick index: the largest tick whose price is at or below `sqrt_price_x64`,
    /// or one below a boundary just crossed downward.
    pub current_tick: i32,
    /// The total active liquidity within the current tick's price range.
    pub liquidity: u128,
    /// Token0 fees earned per unit of liquidity since creation, Q64.64.
    pub fee_growth_global_0_x64: u128,
    /// Token1 fees earned per unit of liquidity since creation, Q64.64.
    pub fee_growth_global_1_x64: u128,
    /// Token0 fees owed to the protocol.
    pub protocol_fees_token_0: u64,
    /// Token1 fees owed to the protocol.
    pub protocol_fees_token_1: u64,
    /// Liquidity mining schedules.
    pub reward_infos: RewardSlots,
}

/// Parameters for initializing a new pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitializePoolParams {
    pub pool_id: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub token0_vault: Pubkey,
    pub token1_vault: Pubkey,
    pub fee_rate: u32,
    pub initial_sqrt_price_x64: u128,
}

/// Identity of a pool: ordered token pair and fee rate.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct PoolKey {
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub fee_rate: u32,
}

impl PoolKey {
    /// Builds the key for a pair given in either order.
    pub fn new(token_a: Pubkey, token_b: Pubkey, fee_rate: u32) -> Self {
        let (token0_mint, token1_mint) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            token0_mint,
            token1_mint,
            fee_rate,
        }
    }
}

impl Pool {
    /// Builds the state of a new pool at its genesis price.
    ///
    /// # Arguments
    /// * `params` - Identity, vaults, fee rate and initial price
    /// * `tick_spacing` - The spacing of the fee tier
    ///
    /// # Errors
    /// * `TokenOrder` unless `token0_mint < token1_mint`
    /// * `PriceOutOfRange` unless the price lies in `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64)`
    pub fn initialize(params: &InitializePoolParams, tick_spacing: u16) -> Result<Self> {
        require!(
            params.token0_mint < params.token1_mint,
            ErrorCode::TokenOrder
        );
        require!(
            params.initial_sqrt_price_x64 >= MIN_SQRT_PRICE_X64
                && params.initial_sqrt_price_x64 < MAX_SQRT_PRICE_X64,
            ErrorCode::PriceOutOfRange
        );
        require!(tick_spacing > 0, ErrorCode::InvalidTickSpacing);

        Ok(Self {
            pool_id: params.pool_id,
            token0_mint: params.token0_mint,
            token1_mint: params.token1_mint,
            token0_vault: params.token0_vault,
            token1_vault: params.token1_vault,
            fee_rate: params.fee_rate,
            tick_spacing,
            sqrt_price_x64: params.initial_sqrt_price_x64,
            current_tick: get_tick_at_sqrt_price(params.initial_sqrt_price_x64)?,
            ..Default::default()
        })
    }

    pub fn key(&self) -> PoolKey {
        PoolKey {
            token0_mint: self.token0_mint,
            token1_mint: self.token1_mint,
            fee_rate: self.fee_rate,
        }
    }

    /// Whether `[tick_lower, tick_upper)` contains the current tick.
    pub fn is_in_range(&self, tick_lower: i32, tick_upper: i32) -> bool {
        self.current_tick >= tick_lower && self.current_tick < tick_upper
    }

    /// Adds protocol fees for the input token of a swap.
    pub fn add_protocol_fees(&mut self, zero_for_one: bool, amount: u64) -> Result<()> {
        let fees = if zero_for_one {
            &mut self.protocol_fees_token_0
        } else {
            &mut self.protocol_fees_token_1
        };
        *fees = fees
            .checked_add(amount)
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        Ok(())
    }
}
