//! Unit tests, one file per module.

use crate::config::AmmConfig;
use crate::constants::Q64;
use crate::errors::ErrorCode;
use crate::instructions::increase_liquidity::IncreaseLiquidityParams;
use crate::state::{InitializePoolParams, PoolStore};
use anchor_lang::prelude::*;

mod config_test;
mod swap_test;

/// Asserts that `result` failed with `expected`.
#[track_caller]
pub(crate) fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: ErrorCode) {
    match result {
        Err(Error::AnchorError(details)) => {
            assert_eq!(details.error_msg, expected.to_string(), "{details:?}")
        }
        other => panic!("Expected {expected:?}, got {other:?}"),
    }
}

/// A deterministic key whose first byte is `seed`.
pub(crate) fn mock_pubkey(seed: u8) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    Pubkey::new_from_array(bytes)
}

/// A 0.3% pool of tokens 1 and 2, priced at 1.0.
pub(crate) fn pool_params() -> InitializePoolParams {
    InitializePoolParams {
        pool_id: mock_pubkey(100),
        token0_mint: mock_pubkey(1),
        token1_mint: mock_pubkey(2),
        token0_vault: mock_pubkey(3),
        token1_vault: mock_pubkey(4),
        fee_rate: 3000,
        initial_sqrt_price_x64: Q64,
    }
}

/// Store for [`pool_params`], created at t = 1000.
pub(crate) fn new_store(config: &AmmConfig) -> PoolStore {
    PoolStore::initialize(config, &pool_params(), 1000).unwrap()
}

pub(crate) fn deposit(amount_0: u64, amount_1: u64) -> IncreaseLiquidityParams {
    IncreaseLiquidityParams {
        amount_0_desired: amount_0,
        amount_1_desired: amount_1,
        ..Default::default()
    }
}
