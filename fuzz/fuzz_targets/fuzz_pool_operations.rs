use anchor_lang::prelude::Pubkey;
use arbitrary::Arbitrary;
use clmm_core::constants::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64, Q64};
use clmm_core::{
    AmmConfig, DecreaseLiquidityParams, IncreaseLiquidityParams, InitializePoolParams, PoolStore,
    SwapParams,
};
use honggfuzz::fuzz;

const SPACING: i32 = 60;
const MAX_POSITIONS: u8 = 8;

#[derive(Debug, Clone, Arbitrary)]
enum PoolOp {
    Open {
        slot: u8,
        lower: i8,
        width: u8,
        amount_0: u32,
        amount_1: u32,
    },
    Burn {
        slot: u8,
        share: u8,
    },
    Collect {
        slot: u8,
    },
    Close {
        slot: u8,
    },
    Swap {
        zero_for_one: bool,
        amount_specified: i32,
    },
    Wait {
        seconds: u8,
    },
}

fn key(seed: u8) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    Pubkey::new_from_array(bytes)
}

fn position_id(slot: u8) -> Pubkey {
    key(60 + slot % MAX_POSITIONS)
}

/// Checks the tick records, the bitmap and the active liquidity against each other.
fn check_invariants(store: &PoolStore) {
    let spacing = store.pool.tick_spacing;
    for (index, tick) in &store.ticks {
        assert!(tick.liquidity_gross > 0);
        assert!(store.tick_bitmap.is_initialized(*index, spacing));
    }
    for index in store.tick_bitmap.initialized_ticks(spacing) {
        assert!(store.ticks.contains_key(&index));
    }

    let current = store.pool.current_tick;
    let active: u128 = store
        .personal_positions
        .values()
        .filter(|p| p.tick_lower_index <= current && current < p.tick_upper_index)
        .map(|p| p.liquidity)
        .sum();
    assert_eq!(store.pool.liquidity, active);
}

fn run(ops: Vec<PoolOp>) {
    let config = AmmConfig::new(key(99));
    let params = InitializePoolParams {
        pool_id: key(100),
        token0_mint: key(1),
        token1_mint: key(2),
        token0_vault: key(3),
        token1_vault: key(4),
        fee_rate: 3000,
        initial_sqrt_price_x64: Q64,
    };
    let mut store = PoolStore::initialize(&config, &params, 1000).unwrap();
    let owner = key(50);
    let mut now = 1000u64;

    for op in ops {
        let before = store.clone();
        let result = match op {
            PoolOp::Open {
                slot,
                lower,
                width,
                amount_0,
                amount_1,
            } => {
                let tick_lower = lower as i32 * SPACING;
                let tick_upper = tick_lower + (width as i32 % 32 + 1) * SPACING;
                let deposit = IncreaseLiquidityParams {
                    amount_0_desired: amount_0 as u64,
                    amount_1_desired: amount_1 as u64,
                    ..Default::default()
                };
                store
                    .open_position(owner, position_id(slot), tick_lower, tick_upper, &deposit, now)
                    .map(|_| ())
            }
            PoolOp::Burn { slot, share } => {
                let id = position_id(slot);
                let liquidity = store
                    .personal_position(&id)
                    .map(|p| p.liquidity * (share as u128 + 1) / 256)
                    .unwrap_or(1);
                let params = DecreaseLiquidityParams {
                    liquidity,
                    ..Default::default()
                };
                store
                    .decrease_liquidity(&owner, &id, &params, now)
                    .map(|_| ())
            }
            PoolOp::Collect { slot } => store
                .collect(&owner, &position_id(slot), u64::MAX, u64::MAX, now)
                .map(|_| ()),
            PoolOp::Close { slot } => store.close_position(&owner, &position_id(slot)),
            PoolOp::Swap {
                zero_for_one,
                amount_specified,
            } => {
                let params = SwapParams {
                    zero_for_one,
                    amount_specified: amount_specified as i64,
                    sqrt_price_limit_x64: if zero_for_one {
                        MIN_SQRT_PRICE_X64 + 1
                    } else {
                        MAX_SQRT_PRICE_X64 - 1
                    },
                    other_amount_threshold: if amount_specified < 0 { u64::MAX } else { 0 },
                    deadline: None,
                    now,
                };
                store.swap(&config, &params).map(|_| ())
            }
            PoolOp::Wait { seconds } => {
                now += seconds as u64;
                Ok(())
            }
        };

        // A rejected operation leaves no trace
        if result.is_err() {
            assert_eq!(store, before);
        }
        check_invariants(&store);
        store.observe(now, &[0]).unwrap();
    }
}

fn main() {
    loop {
        fuzz!(|data: Vec<PoolOp>| {
            run(data);
        });
    }
}
