/// Initialize Pool Instruction Module
///
/// Creates a pool for an ordered token pair at an enabled fee tier. The pool starts at the
/// caller's genesis price with no liquidity, and its oracle ring starts with one observation
/// taken at creation time.
use crate::config::AmmConfig;
use crate::events::PoolEvent;
use crate::oracle::{block_timestamp, Oracle};
use crate::state::pool::{InitializePoolParams, Pool};
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Event recorded when a new liquidity pool is initialized
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInitialized {
    /// The address of the newly created pool
    pub pool_id: Pubkey,

    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,

    /// Fee rate in parts per million
    pub fee_rate: u32,

    pub tick_spacing: u16,

    /// Initial square root price
    pub sqrt_price_x64: u128,

    /// Initial tick index
    pub tick: i32,

    /// Time of pool creation
    pub timestamp: u64,
}

/// Builds a new pool and its oracle.
///
/// # Parameters
/// * `config` - Supplies the tick spacing of the fee tier
/// * `params` - Identity, vaults, fee rate and genesis price
/// * `now` - Current time
///
/// # Errors
/// * `FeeTierNotEnabled` - If the fee rate has no enabled tier
/// * `TokenOrder` - If `token0_mint` is not strictly below `token1_mint`
/// * `PriceOutOfRange` - If the genesis price is outside the legal bounds
pub fn handler(
    config: &AmmConfig,
    params: &InitializePoolParams,
    now: u64,
) -> Result<(Pool, Oracle, PoolInitialized)> {
    let tick_spacing = config.tick_spacing_for(params.fee_rate)?;
    let pool = Pool::initialize(params, tick_spacing)?;
    let oracle = Oracle::new(pool.pool_id, block_timestamp(now)?);

    msg!(
        "Pool initialized: {} <> {} with fee rate: {}",
        pool.token0_mint,
        pool.token1_mint,
        pool.fee_rate
    );
    msg!(
        "Initial sqrt price: {}, initial tick: {}",
        pool.sqrt_price_x64,
        pool.current_tick
    );

    let event = PoolInitialized {
        pool_id: pool.pool_id,
        token0_mint: pool.token0_mint,
        token1_mint: pool.token1_mint,
        fee_rate: pool.fee_rate,
        tick_spacing,
        sqrt_price_x64: pool.sqrt_price_x64,
        tick: pool.current_tick,
        timestamp: now,
    };
    Ok((pool, oracle, event))
}

impl PoolStore {
    /// Creates the store of a new pool.
    pub fn initialize(config: &AmmConfig, params: &InitializePoolParams, now: u64) -> Result<Self> {
        let (pool, oracle, event) = handler(config, params, now)?;
        let mut store = PoolStore::new(pool, oracle);
        store.events.push(PoolEvent::PoolInitialized(event));
        Ok(store)
    }
}
