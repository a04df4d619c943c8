use super::{assert_error, deposit, mock_pubkey, new_store};
use crate::config::AmmConfig;
use crate::constants::*;
use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::instructions::decrease_liquidity::DecreaseLiquidityParams;
use crate::instructions::swap::{SwapParams, SwapResult};
use crate::math::tick_math::get_sqrt_price_at_tick;
use crate::oracle::ObservationSnapshot;
use crate::state::PoolStore;
use anchor_lang::prelude::*;

const LIQUIDITY_A: u128 = 33_837_499_809;
const LIQUIDITY_B: u128 = 34_867_952_798;

fn owner() -> Pubkey {
    mock_pubkey(50)
}

fn position_a() -> Pubkey {
    mock_pubkey(60)
}

fn position_b() -> Pubkey {
    mock_pubkey(61)
}

fn config() -> AmmConfig {
    AmmConfig::new(mock_pubkey(99))
}

/// Position A over [-600, 600) only.
fn store_with_a() -> PoolStore {
    let mut store = new_store(&config());
    store
        .open_position(owner(), position_a(), -600, 600, &deposit(1_000_000_000, 1_000_000_000), 1000)
        .unwrap();
    store
}

/// Position A plus position B over [-1200, -600), below the price.
fn store_with_a_and_b() -> PoolStore {
    let mut store = store_with_a();
    store
        .open_position(owner(), position_b(), -1200, -600, &deposit(0, 1_000_000_000), 1000)
        .unwrap();
    store
}

/// Exact input when `amount_specified > 0`, exact output otherwise.
///
/// The threshold never binds: a zero minimum output, or an unbounded maximum input.
fn unbounded_threshold(amount_specified: i64) -> u64 {
    if amount_specified < 0 {
        u64::MAX
    } else {
        0
    }
}

fn sell_token_0(amount_specified: i64, now: u64) -> SwapParams {
    SwapParams {
        zero_for_one: true,
        amount_specified,
        sqrt_price_limit_x64: MIN_SQRT_PRICE_X64 + 1,
        other_amount_threshold: unbounded_threshold(amount_specified),
        deadline: None,
        now,
    }
}

fn sell_token_1(amount_specified: i64, now: u64) -> SwapParams {
    SwapParams {
        zero_for_one: false,
        amount_specified,
        sqrt_price_limit_x64: MAX_SQRT_PRICE_X64 - 1,
        other_amount_threshold: unbounded_threshold(amount_specified),
        deadline: None,
        now,
    }
}

/// Runs the first three swaps of the walk down to tick -913.
fn swap_down(store: &mut PoolStore) -> [SwapResult; 3] {
    let config = config();
    [
        store.swap(&config, &sell_token_0(1_000_000, 1010)).unwrap(),
        store.swap(&config, &sell_token_0(100_000_000, 1020)).unwrap(),
        store.swap(&config, &sell_token_0(1_500_000_000, 1030)).unwrap(),
    ]
}

mod single_range_tests {
    use super::*;

    #[test]
    fn test_exact_input_zero_for_one() {
        let mut store = store_with_a();
        let result = store.swap(&config(), &sell_token_0(1_000_000, 1010)).unwrap();

        assert_eq!((result.amount_0, result.amount_1), (1_000_000, -996_970));
        assert_eq!(result.fee_amount, 3000);
        assert_eq!(result.protocol_fee, 360);
        assert_eq!(result.sqrt_price_x64, 18_446_200_568_365_762_324);
        assert_eq!(result.tick, -1);
        assert_eq!(result.ticks_crossed, 0);
        assert_eq!(result.amount_in(true), 1_000_000);
        assert_eq!(result.amount_out(true), 996_970);

        assert_eq!(store.pool.sqrt_price_x64, result.sqrt_price_x64);
        assert_eq!(store.pool.current_tick, -1);
        assert_eq!(store.pool.fee_growth_global_0_x64, 1_439_214_026_730);
        assert_eq!(store.pool.fee_growth_global_1_x64, 0);
        assert_eq!(store.pool.protocol_fees_token_0, 360);
    }

    #[test]
    fn test_exact_output_zero_for_one() {
        let mut store = store_with_a();
        let result = store.swap(&config(), &sell_token_0(-1_000_000, 1010)).unwrap();

        assert_eq!((result.amount_0, result.amount_1), (1_003_040, -1_000_000));
        assert_eq!(result.fee_amount, 3010);
        assert_eq!(result.protocol_fee, 361);
        assert_eq!(result.sqrt_price_x64, 18_446_198_916_881_244_722);
        assert_eq!(result.tick, -1);
    }

    #[test]
    fn test_exact_input_one_for_zero() {
        let mut store = store_with_a();
        let result = store.swap(&config(), &sell_token_1(1_000_000, 1010)).unwrap();

        assert_eq!((result.amount_0, result.amount_1), (-996_970, 1_000_000));
        assert_eq!(result.sqrt_price_x64, 18_447_287_595_067_373_588);
        assert_eq!(result.tick, 0);
        assert_eq!(store.pool.fee_growth_global_0_x64, 0);
        assert_eq!(store.pool.protocol_fees_token_1, 360);
    }

    #[test]
    fn test_price_limit_stops_the_swap() {
        let mut store = store_with_a();
        let limit = get_sqrt_price_at_tick(-60).unwrap();
        let params = SwapParams {
            sqrt_price_limit_x64: limit,
            ..sell_token_0(1_000_000_000_000, 1010)
        };
        let result = store.swap(&config(), &params).unwrap();

        assert_eq!(result.sqrt_price_x64, limit);
        assert_eq!(result.tick, -60);
        assert_eq!((result.amount_0, result.amount_1), (101_965_729, -101_355_322));
        assert_eq!(result.fee_amount, 305_898);
        assert_eq!(result.protocol_fee, 36_707);
        // Only the input needed to reach the limit is taken
        assert_eq!(1_000_000_000_000 - result.amount_0, 999_898_034_271);

        // floor((305_898 - 36_707) * 2^64 / LIQUIDITY_A)
        assert_eq!(store.pool.fee_growth_global_0_x64, 146_751_311_768_760);
        assert_eq!(store.pool.fee_growth_global_1_x64, 0);
        assert_eq!(store.pool.sqrt_price_x64, limit);
    }

    #[test]
    fn test_price_limit_stops_exact_output() {
        let mut store = store_with_a();
        let limit = get_sqrt_price_at_tick(-60).unwrap();
        let params = SwapParams {
            sqrt_price_limit_x64: limit,
            ..sell_token_0(-1_000_000_000_000, 1010)
        };
        let result = store.swap(&config(), &params).unwrap();

        // Same walk as exact input: the limit is reached before either amount runs out
        assert_eq!((result.amount_0, result.amount_1), (101_965_729, -101_355_322));
        assert_eq!(1_000_000_000_000 + result.amount_1, 999_898_644_678);
        assert_eq!(result.sqrt_price_x64, limit);
        assert_eq!(store.pool.fee_growth_global_0_x64, 146_751_311_768_760);
    }

    #[test]
    fn test_swap_through_empty_pool_moves_price_only() {
        let mut store = new_store(&config());
        let limit = get_sqrt_price_at_tick(-600).unwrap();
        let params = SwapParams {
            sqrt_price_limit_x64: limit,
            ..sell_token_0(1_000_000, 1010)
        };
        let result = store.swap(&config(), &params).unwrap();

        assert_eq!((result.amount_0, result.amount_1), (0, 0));
        assert_eq!(result.fee_amount, 0);
        assert_eq!(store.pool.sqrt_price_x64, limit);
        assert_eq!(store.pool.current_tick, -600);
    }

    #[test]
    fn test_swap_event() {
        let mut store = store_with_a();
        store.swap(&config(), &sell_token_0(1_000_000, 1010)).unwrap();
        match store.events.last() {
            Some(PoolEvent::SwapExecuted(event)) => {
                assert!(event.zero_for_one);
                assert_eq!((event.amount_0, event.amount_1), (1_000_000, -996_970));
                assert_eq!(event.tick, -1);
                assert_eq!(event.timestamp, 1010);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_rejected_requests() {
        let mut store = store_with_a();
        let config = config();

        assert_error(store.swap(&config, &sell_token_0(0, 1010)), ErrorCode::ZeroAmount);

        let late = SwapParams {
            deadline: Some(1009),
            ..sell_token_0(1_000, 1010)
        };
        assert_error(store.swap(&config, &late), ErrorCode::DeadlineExceeded);

        for limit in [Q64, Q64 + 1, MIN_SQRT_PRICE_X64] {
            let params = SwapParams {
                sqrt_price_limit_x64: limit,
                ..sell_token_0(1_000, 1010)
            };
            assert_error(store.swap(&config, &params), ErrorCode::InvalidPriceLimit);
        }
        for limit in [Q64, Q64 - 1, MAX_SQRT_PRICE_X64] {
            let params = SwapParams {
                sqrt_price_limit_x64: limit,
                ..sell_token_1(1_000, 1010)
            };
            assert_error(store.swap(&config, &params), ErrorCode::InvalidPriceLimit);
        }
    }

    #[test]
    fn test_slippage_failure_rolls_back() {
        let mut store = store_with_a();
        let before = store.clone();

        let exact_in = SwapParams {
            other_amount_threshold: 996_971,
            ..sell_token_0(1_000_000, 1010)
        };
        assert_error(store.swap(&config(), &exact_in), ErrorCode::SlippageExceeded);

        let exact_out = SwapParams {
            other_amount_threshold: 1_003_039,
            ..sell_token_0(-1_000_000, 1010)
        };
        assert_error(store.swap(&config(), &exact_out), ErrorCode::SlippageExceeded);

        assert_eq!(store, before);
    }

    #[test]
    fn test_exact_output_maximum_input_is_inclusive() {
        let mut store = store_with_a();
        let at_bound = SwapParams {
            other_amount_threshold: 1_003_040,
            ..sell_token_0(-1_000_000, 1010)
        };
        let result = store.swap(&config(), &at_bound).unwrap();
        assert_eq!(result.amount_0, 1_003_040);
    }

    #[test]
    fn test_touched_account_ceiling() {
        let mut store = store_with_a();
        let mut config = config();
        let admin = config.owner;

        // The first swap reads bitmap words 0 and -1
        config.set_max_touched_ticks(&admin, Some(1)).unwrap();
        let before = store.clone();
        assert_error(
            store.swap(&config, &sell_token_0(1_000_000, 1010)),
            ErrorCode::TooManyTouchedAccounts,
        );
        assert_eq!(store, before);

        config.set_max_touched_ticks(&admin, Some(2)).unwrap();
        store.swap(&config, &sell_token_0(1_000_000, 1010)).unwrap();
    }

    #[test]
    fn test_quote_does_not_commit() {
        let store = store_with_a();
        let (quoted, access_list) = store
            .quote_swap(&config(), &sell_token_0(1_000_000, 1010))
            .unwrap();
        assert_eq!(quoted.amount_1, -996_970);
        assert_eq!(access_list.bitmap_words.iter().copied().collect::<Vec<_>>(), vec![-1, 0]);
        assert!(access_list.ticks.is_empty());

        let mut committed = store.clone();
        let executed = committed
            .swap(&config(), &sell_token_0(1_000_000, 1010))
            .unwrap();
        assert_eq!(quoted, executed);
        assert_eq!(store, store_with_a());
    }
}

mod crossing_tests {
    use super::*;

    #[test]
    fn test_walk_across_initialized_tick() {
        let mut store = store_with_a_and_b();
        let [first, second, third] = swap_down(&mut store);

        assert_eq!((first.amount_0, first.amount_1), (1_000_000, -996_970));
        assert_eq!((second.amount_0, second.amount_1), (100_000_000, -99_401_254));
        assert_eq!(second.tick, -60);
        assert_eq!(second.sqrt_price_x64, 18_392_011_295_817_894_871);

        assert_eq!((third.amount_0, third.amount_1), (1_500_000_000, -1_424_141_704));
        assert_eq!(third.fee_amount, 4_500_001);
        assert_eq!(third.protocol_fee, 539_999);
        assert_eq!(third.ticks_crossed, 1);
        assert_eq!(third.sqrt_price_x64, 17_624_081_597_281_261_413);
        assert_eq!(third.tick, -913);
        assert_eq!(third.liquidity, LIQUIDITY_B);

        assert_eq!(store.pool.liquidity, LIQUIDITY_B);
        assert_eq!(store.pool.fee_growth_global_0_x64, 2_280_047_463_967_136);
        assert_eq!(store.pool.protocol_fees_token_0, 576_359);

        let crossed = store.tick(-600).unwrap();
        assert_eq!(crossed.fee_growth_outside_0_x64, 1_487_505_108_895_278);
        assert_eq!(crossed.fee_growth_outside_1_x64, 0);
        // Ticks the walk did not reach are untouched
        assert_eq!(store.tick(-1200).unwrap().fee_growth_outside_0_x64, 0);
    }

    #[test]
    fn test_crossing_is_in_the_access_list() {
        let mut store = store_with_a_and_b();
        let config = config();
        store.swap(&config, &sell_token_0(1_000_000, 1010)).unwrap();
        store.swap(&config, &sell_token_0(100_000_000, 1020)).unwrap();

        let (_, access_list) = store
            .quote_swap(&config, &sell_token_0(1_500_000_000, 1030))
            .unwrap();
        assert_eq!(access_list.ticks.iter().copied().collect::<Vec<_>>(), vec![-600]);
        assert_eq!(access_list.bitmap_words.len(), 1);
    }

    #[test]
    fn test_exact_output_back_up() {
        let mut store = store_with_a_and_b();
        swap_down(&mut store);

        let result = store
            .swap(&config(), &sell_token_1(-500_000_000, 1040))
            .unwrap();
        assert_eq!((result.amount_0, result.amount_1), (-500_000_000, 464_129_843));
        assert_eq!(result.fee_amount, 1_392_390);
        assert_eq!(result.protocol_fee, 167_086);
        assert_eq!(result.sqrt_price_x64, 17_868_890_904_359_301_660);
        assert_eq!(result.tick, -637);
        assert_eq!(result.ticks_crossed, 0);

        assert_eq!(store.pool.fee_growth_global_1_x64, 648_241_938_132_630);
        assert_eq!(store.pool.protocol_fees_token_1, 167_086);
    }

    #[test]
    fn test_oracle_records_pre_swap_state() {
        let mut store = store_with_a_and_b();
        swap_down(&mut store);

        let observed = store.observe(1040, &[0, 5]).unwrap();
        assert_eq!(
            observed,
            vec![
                ObservationSnapshot {
                    tick_cumulative: -9740,
                    liquidity_cumulative: LIQUIDITY_A * 30 + LIQUIDITY_B * 10,
                },
                ObservationSnapshot {
                    tick_cumulative: -5175,
                    liquidity_cumulative: LIQUIDITY_A * 30 + LIQUIDITY_B * 5,
                },
            ]
        );
        assert_error(store.observe(1040, &[41]), ErrorCode::ObservationTooOld);
    }
}

mod fee_accounting_tests {
    use super::*;

    fn traded_store() -> PoolStore {
        let mut store = store_with_a_and_b();
        swap_down(&mut store);
        store
            .swap(&config(), &sell_token_1(-500_000_000, 1040))
            .unwrap();
        store
    }

    fn owed(store: &PoolStore, id: &Pubkey) -> (u64, u64) {
        let position = store.personal_position(id).unwrap();
        (position.token_fees_owed_0, position.token_fees_owed_1)
    }

    #[test]
    fn test_positions_earn_fees_inside_their_range() {
        let mut store = traded_store();
        store.collect(&owner(), &position_a(), 0, 0, 1050).unwrap();
        store.collect(&owner(), &position_b(), 0, 0, 1050).unwrap();

        assert_eq!(owed(&store, &position_a()), (2_728_581, 0));
        assert_eq!(owed(&store, &position_b()), (1_498_059, 1_225_303));
        assert_eq!(
            store.protocol_position(-1200, -600).unwrap().tokens_owed_1,
            1_225_303
        );
    }

    #[test]
    fn test_burn_after_trading() {
        let mut store = traded_store();
        let burned = store
            .decrease_liquidity(
                &owner(),
                &position_a(),
                &DecreaseLiquidityParams {
                    liquidity: LIQUIDITY_A,
                    ..Default::default()
                },
                1050,
            )
            .unwrap();
        assert_eq!((burned.amount_0, burned.amount_1), (2_030_452_988, 0));
        assert_eq!(owed(&store, &position_a()), (2_728_581 + 2_030_452_988, 0));

        let collected = store
            .collect(&owner(), &position_a(), u64::MAX, u64::MAX, 1050)
            .unwrap();
        assert_eq!(collected, (2_033_181_569, 0));
        store.close_position(&owner(), &position_a()).unwrap();
        assert!(store.tick(600).is_none());
        assert_eq!(store.pool.liquidity, LIQUIDITY_B);
    }

    #[test]
    fn test_protocol_fees_collection() {
        let mut store = traded_store();
        let config = config();

        assert_error(
            store.collect_protocol_fees(&config, &owner(), u64::MAX, u64::MAX, 1050),
            ErrorCode::UnauthorizedAccess,
        );
        let collected = store
            .collect_protocol_fees(&config, &config.owner, 500_000, u64::MAX, 1050)
            .unwrap();
        assert_eq!(collected, (500_000, 167_086));
        assert_eq!(store.pool.protocol_fees_token_0, 76_359);
        assert_eq!(store.pool.protocol_fees_token_1, 0);
        assert!(matches!(
            store.events.last(),
            Some(PoolEvent::ProtocolFeesCollected(event)) if event.amount_1 == 167_086
        ));
    }
}
