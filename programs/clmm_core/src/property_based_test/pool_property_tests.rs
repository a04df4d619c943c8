//! Property-based tests for pool state
//!
//! Random sequences of liquidity changes and swaps are run against a fresh store, and the
//! bookkeeping invariants are checked after every step.

use crate::config::AmmConfig;
use crate::constants::*;
use crate::errors::ErrorCode;
use crate::instructions::decrease_liquidity::DecreaseLiquidityParams;
use crate::instructions::swap::SwapParams;
use crate::math::get_sqrt_price_at_tick;
use crate::state::PoolStore;
use crate::unit_test::{assert_error, deposit, mock_pubkey, new_store};
use anchor_lang::prelude::*;
use proptest::prelude::*;

const SPACING: i32 = TICK_SPACING_MEDIUM as i32;
const FULL_RANGE: (i32, i32) = (-443_580, 443_580);

mod strategies {
    use super::*;

    /// (lower in spacings, width in spacings, burned afterwards)
    pub fn range_op() -> impl Strategy<Value = (i32, i32, bool)> {
        (-20..20i32, 1..10i32, any::<bool>())
    }

    /// (zero_for_one, amount in)
    pub fn swap_op() -> impl Strategy<Value = (bool, i64)> {
        (any::<bool>(), 1..100_000_000i64)
    }
}

fn config() -> AmmConfig {
    AmmConfig::new(mock_pubkey(99))
}

fn owner() -> Pubkey {
    mock_pubkey(50)
}

/// Two positions so the pool is never without liquidity: a narrow one around the price and
/// a full range one.
fn liquid_store() -> PoolStore {
    let mut store = new_store(&config());
    store
        .open_position(owner(), mock_pubkey(60), -600, 600, &deposit(1_000_000_000, 1_000_000_000), 1000)
        .unwrap();
    store
        .open_position(
            owner(),
            mock_pubkey(61),
            FULL_RANGE.0,
            FULL_RANGE.1,
            &deposit(1_000_000_000, 1_000_000_000),
            1000,
        )
        .unwrap();
    store
}

fn exact_input(zero_for_one: bool, amount: i64, now: u64) -> SwapParams {
    SwapParams {
        zero_for_one,
        amount_specified: amount,
        sqrt_price_limit_x64: if zero_for_one {
            MIN_SQRT_PRICE_X64 + 1
        } else {
            MAX_SQRT_PRICE_X64 - 1
        },
        other_amount_threshold: 0,
        deadline: None,
        now,
    }
}

/// Checks the tick records, the bitmap and the active liquidity against each other.
fn check_consistency(store: &PoolStore) -> std::result::Result<(), TestCaseError> {
    let spacing = store.pool.tick_spacing;

    for (index, tick) in &store.ticks {
        prop_assert!(tick.liquidity_gross > 0, "tick {} kept without liquidity", index);
        prop_assert!(store.tick_bitmap.is_initialized(*index, spacing), "tick {} not in bitmap", index);
    }
    for index in store.tick_bitmap.initialized_ticks(spacing) {
        prop_assert!(store.ticks.contains_key(&index), "bitmap bit {} without a tick", index);
    }

    let net: i128 = store.ticks.values().map(|tick| tick.liquidity_net).sum();
    prop_assert_eq!(net, 0);

    let current = store.pool.current_tick;
    let active: u128 = store
        .personal_positions
        .values()
        .filter(|p| p.tick_lower_index <= current && current < p.tick_upper_index)
        .map(|p| p.liquidity)
        .sum();
    prop_assert_eq!(store.pool.liquidity, active);

    let lower = get_sqrt_price_at_tick(current).unwrap();
    let upper = get_sqrt_price_at_tick(current + 1).unwrap();
    prop_assert!(lower <= store.pool.sqrt_price_x64 && store.pool.sqrt_price_x64 <= upper);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_ticks_and_bitmap_agree(ops in prop::collection::vec(strategies::range_op(), 1..12)) {
        let mut store = new_store(&config());

        for (i, (lower, width, _)) in ops.iter().enumerate() {
            let tick_lower = lower * SPACING;
            let tick_upper = (lower + width) * SPACING;
            let id = mock_pubkey(i as u8 + 1);
            store
                .open_position(owner(), id, tick_lower, tick_upper, &deposit(1_000_000, 1_000_000), 1000)
                .unwrap();
            check_consistency(&store)?;
        }

        for (i, (_, _, burned)) in ops.iter().enumerate() {
            if !burned {
                continue;
            }
            let id = mock_pubkey(i as u8 + 1);
            let liquidity = store.personal_position(&id).unwrap().liquidity;
            let params = DecreaseLiquidityParams { liquidity, ..Default::default() };
            store.decrease_liquidity(&owner(), &id, &params, 1001).unwrap();
            check_consistency(&store)?;
        }

        if ops.iter().all(|(_, _, burned)| *burned) {
            prop_assert!(store.ticks.is_empty());
            prop_assert!(store.tick_bitmap.initialized_ticks(store.pool.tick_spacing).is_empty());
        }
    }

    #[test]
    fn test_swaps_keep_accounting_consistent(ops in prop::collection::vec(strategies::swap_op(), 1..16)) {
        let config = config();
        let mut store = liquid_store();

        for (i, (zero_for_one, amount)) in ops.into_iter().enumerate() {
            let before = store.pool.clone();
            let result = store
                .swap(&config, &exact_input(zero_for_one, amount, 1010 + i as u64 * 10))
                .unwrap();

            // Input is paid in, output is paid out, and the budget is respected
            prop_assert_eq!(result.amount_in(zero_for_one), amount as u64);
            let (paid, received) = if zero_for_one {
                (result.amount_0, result.amount_1)
            } else {
                (result.amount_1, result.amount_0)
            };
            prop_assert!(paid > 0 && received <= 0);
            prop_assert!(result.protocol_fee <= result.fee_amount);

            // Price moves only in the trade direction
            if zero_for_one {
                prop_assert!(store.pool.sqrt_price_x64 <= before.sqrt_price_x64);
            } else {
                prop_assert!(store.pool.sqrt_price_x64 >= before.sqrt_price_x64);
            }

            // Fee growth and protocol fees only accumulate
            prop_assert!(store.pool.fee_growth_global_0_x64 >= before.fee_growth_global_0_x64);
            prop_assert!(store.pool.fee_growth_global_1_x64 >= before.fee_growth_global_1_x64);
            prop_assert!(store.pool.protocol_fees_token_0 >= before.protocol_fees_token_0);
            prop_assert!(store.pool.protocol_fees_token_1 >= before.protocol_fees_token_1);

            check_consistency(&store)?;
        }
    }

    #[test]
    fn test_round_trip_never_profits(zero_for_one in any::<bool>(), amount in 1..1_000_000_000i64) {
        let config = config();
        let mut store = liquid_store();

        let there = store.swap(&config, &exact_input(zero_for_one, amount, 1010)).unwrap();
        let received = there.amount_out(zero_for_one);
        prop_assume!(received > 0);

        let back = store
            .swap(&config, &exact_input(!zero_for_one, received as i64, 1020))
            .unwrap();
        prop_assert!(back.amount_out(!zero_for_one) <= amount as u64);
    }

    #[test]
    fn test_failed_swap_changes_nothing(zero_for_one in any::<bool>(), amount in 1..1_000_000_000i64) {
        let config = config();
        let mut store = liquid_store();
        let before = store.clone();

        let params = SwapParams {
            other_amount_threshold: u64::MAX,
            ..exact_input(zero_for_one, amount, 1010)
        };
        assert_error(store.swap(&config, &params), ErrorCode::SlippageExceeded);
        prop_assert_eq!(store, before);
    }

    #[test]
    fn test_observe_extrapolates_current_tick(
        ops in prop::collection::vec(strategies::swap_op(), 1..8),
        idle in 1..500u32,
    ) {
        let config = config();
        let mut store = liquid_store();
        let mut now = 1000;
        for (zero_for_one, amount) in ops {
            now += 10;
            store.swap(&config, &exact_input(zero_for_one, amount, now)).unwrap();
        }
        now += idle as u64;

        let snapshot = store.clone();
        let seconds_agos: Vec<u32> = (0..=idle).collect();
        let observations = store.observe(now, &seconds_agos).unwrap();
        prop_assert_eq!(&store, &snapshot);
        prop_assert_eq!(&observations, &store.observe(now, &seconds_agos).unwrap());

        // After the last swap the tick is constant, so every second adds it once
        for pair in observations.windows(2) {
            prop_assert_eq!(
                pair[0].tick_cumulative - pair[1].tick_cumulative,
                store.pool.current_tick as i64
            );
            prop_assert_eq!(
                pair[0].liquidity_cumulative - pair[1].liquidity_cumulative,
                store.pool.liquidity
            );
        }
    }
}
