use crate::config::AmmConfig;
use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Event emitted when protocol fees are collected
#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolFeesCollected {
    /// The pool from which fees were collected
    pub pool_id: Pubkey,

    /// The authority that collected the fees
    pub authority: Pubkey,

    /// The amount of token0 fees collected
    pub amount_0: u64,

    /// The amount of token1 fees collected
    pub amount_1: u64,

    /// The time when the collection occurred
    pub timestamp: u64,
}

/// Collects protocol fees from a pool
///
/// Withdraws up to the requested amounts from the protocol's share of swap fees. Only the
/// configuration owner can execute this.
///
/// # Arguments
/// * `tx` - Staged view of the pool
/// * `config` - The configuration naming the fee collector
/// * `caller` - Who is collecting
/// * `amount_0_requested` / `amount_1_requested` - Upper bounds on the withdrawal
/// * `now` - Current time
///
/// # Returns
/// * `(amount_0, amount_1)` actually withdrawn
pub fn handler(
    tx: &mut PoolTransaction,
    config: &AmmConfig,
    caller: &Pubkey,
    amount_0_requested: u64,
    amount_1_requested: u64,
    now: u64,
) -> Result<(u64, u64)> {
    require_keys_eq!(config.owner, *caller, ErrorCode::UnauthorizedAccess);

    let amount_0 = amount_0_requested.min(tx.pool.protocol_fees_token_0);
    let amount_1 = amount_1_requested.min(tx.pool.protocol_fees_token_1);
    tx.pool.protocol_fees_token_0 -= amount_0;
    tx.pool.protocol_fees_token_1 -= amount_1;

    msg!(
        "Protocol fees collected from {}: {} / {}",
        tx.pool.pool_id,
        amount_0,
        amount_1
    );

    let event = ProtocolFeesCollected {
        pool_id: tx.pool.pool_id,
        authority: *caller,
        amount_0,
        amount_1,
        timestamp: now,
    };
    tx.emit(PoolEvent::ProtocolFeesCollected(event));

    Ok((amount_0, amount_1))
}

impl PoolStore {
    /// See [`handler`].
    pub fn collect_protocol_fees(
        &mut self,
        config: &AmmConfig,
        caller: &Pubkey,
        amount_0_requested: u64,
        amount_1_requested: u64,
        now: u64,
    ) -> Result<(u64, u64)> {
        self.transact(|tx| {
            handler(
                tx,
                config,
                caller,
                amount_0_requested,
                amount_1_requested,
                now,
            )
        })
    }
}
