// tests/route_integration_test.rs
//
// Multi-hop swaps across a registry of pools. A route must behave exactly like the
// equivalent chain of single-pool swaps, and must leave every pool untouched when any hop
// or the final slippage check fails.

use anchor_lang::prelude::{Error, Pubkey, Result};
use clmm_core::constants::{MIN_SQRT_PRICE_X64, Q64};
use clmm_core::{
    AmmConfig, ErrorCode, ExactInputParams, ExactOutputParams, IncreaseLiquidityParams,
    InitializePoolParams, PoolKey, PoolRegistry, PoolStore, SwapParams, SwapPath,
};

const NOW: u64 = 1000;
const FEE: u32 = 3000;

fn key(seed: u8) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    Pubkey::new_from_array(bytes)
}

#[track_caller]
fn assert_error<T: std::fmt::Debug>(result: Result<T>, expected: ErrorCode) {
    match result {
        Err(Error::AnchorError(details)) => assert_eq!(details.error_msg, expected.to_string()),
        other => panic!("Expected {expected:?}, got {other:?}"),
    }
}

fn token(n: u8) -> Pubkey {
    key(n)
}

fn create_pool(registry: &mut PoolRegistry, a: u8, b: u8, liquid: bool) {
    let params = InitializePoolParams {
        pool_id: key(100 + a * 10 + b),
        token0_mint: token(a),
        token1_mint: token(b),
        token0_vault: key(200 + a),
        token1_vault: key(200 + b),
        fee_rate: FEE,
        initial_sqrt_price_x64: Q64,
    };
    let store = registry.create_pool(&params, NOW).unwrap();
    if liquid {
        store
            .open_position(
                key(50),
                key(60 + a * 10 + b),
                -600,
                600,
                &IncreaseLiquidityParams {
                    amount_0_desired: 1_000_000_000,
                    amount_1_desired: 1_000_000_000,
                    ..Default::default()
                },
                NOW,
            )
            .unwrap();
    }
}

/// Pools 1/2 and 2/3 with liquidity, and an empty pool 2/4.
fn registry() -> PoolRegistry {
    let mut registry = PoolRegistry::new(AmmConfig::new(key(99)));
    create_pool(&mut registry, 1, 2, true);
    create_pool(&mut registry, 2, 3, true);
    create_pool(&mut registry, 2, 4, false);
    registry
}

fn pool(registry: &PoolRegistry, a: u8, b: u8) -> &PoolStore {
    registry.pool(&PoolKey::new(token(a), token(b), FEE)).unwrap()
}

fn path(tokens: &[u8]) -> SwapPath {
    SwapPath::new(
        tokens.iter().map(|n| token(*n)).collect(),
        vec![FEE; tokens.len().saturating_sub(1)],
    )
}

fn exact_input(tokens: &[u8], amount_in: u64) -> ExactInputParams {
    ExactInputParams {
        path: path(tokens),
        amount_in,
        amount_out_minimum: 0,
        deadline: None,
        now: 1010,
    }
}

fn exact_output(tokens: &[u8], amount_out: u64) -> ExactOutputParams {
    ExactOutputParams {
        path: path(tokens),
        amount_out,
        amount_in_maximum: u64::MAX,
        deadline: None,
        now: 1010,
    }
}

fn sell_token_0(amount_specified: i64) -> SwapParams {
    SwapParams {
        zero_for_one: true,
        amount_specified,
        sqrt_price_limit_x64: MIN_SQRT_PRICE_X64 + 1,
        other_amount_threshold: 0,
        deadline: None,
        now: 1010,
    }
}

#[test]
fn test_exact_input_matches_chained_swaps() {
    let mut routed = registry();
    let mut chained = routed.clone();

    let result = routed.swap_exact_input(&exact_input(&[1, 2, 3], 1_000_000)).unwrap();

    let config = chained.config.clone();
    let key_12 = PoolKey::new(token(1), token(2), FEE);
    let key_23 = PoolKey::new(token(2), token(3), FEE);
    let first = chained
        .pool_mut(&key_12)
        .unwrap()
        .swap(&config, &sell_token_0(1_000_000))
        .unwrap();
    let second = chained
        .pool_mut(&key_23)
        .unwrap()
        .swap(&config, &sell_token_0(first.amount_out(true) as i64))
        .unwrap();

    assert_eq!(result.amount_in, 1_000_000);
    assert_eq!(result.amount_out, second.amount_out(true));
    assert_eq!(result.hops, vec![first, second]);
    assert_eq!(first.amount_out(true), 996_970);
    assert!(result.amount_out < first.amount_out(true));

    assert_eq!(pool(&routed, 1, 2), pool(&chained, 1, 2));
    assert_eq!(pool(&routed, 2, 3), pool(&chained, 2, 3));
}

#[test]
fn test_exact_input_reversed_path() {
    let mut registry = registry();
    let result = registry.swap_exact_input(&exact_input(&[3, 2, 1], 1_000_000)).unwrap();

    // Each hop sells token1 for token0
    assert!(result.hops.iter().all(|hop| hop.amount_1 > 0 && hop.amount_0 < 0));
    assert_eq!(result.amount_out, result.hops[1].amount_out(false));
    assert!(pool(&registry, 1, 2).pool.sqrt_price_x64 > Q64);
    assert!(pool(&registry, 2, 3).pool.sqrt_price_x64 > Q64);
}

#[test]
fn test_exact_output_delivers_exact_amount() {
    let mut registry = registry();
    let result = registry.swap_exact_output(&exact_output(&[1, 2, 3], 1_000_000)).unwrap();

    assert_eq!(result.amount_out, 1_000_000);
    assert_eq!(result.hops[1].amount_out(true), 1_000_000);
    // The first hop delivers exactly what the second one consumes
    assert_eq!(result.hops[0].amount_out(true), result.hops[1].amount_in(true));
    assert_eq!(result.amount_in, result.hops[0].amount_in(true));

    // Paying that input through the same route buys at least the same output
    let mut fresh = self::registry();
    let forward = fresh
        .swap_exact_input(&exact_input(&[1, 2, 3], result.amount_in))
        .unwrap();
    assert!(forward.amount_out >= 1_000_000);
}

#[test]
fn test_malformed_paths_are_rejected() {
    let mut registry = registry();

    let mut params = exact_input(&[1], 1_000);
    assert_error(registry.swap_exact_input(&params), ErrorCode::InvalidRoute);

    params.path = SwapPath::new(vec![token(1), token(2), token(3)], vec![FEE]);
    assert_error(registry.swap_exact_input(&params), ErrorCode::InvalidRoute);

    // Same token on both sides of a hop
    assert_error(
        registry.swap_exact_input(&exact_input(&[1, 1], 1_000)),
        ErrorCode::InvalidRoute,
    );

    // Same pool twice
    assert_error(
        registry.swap_exact_input(&exact_input(&[1, 2, 1], 1_000)),
        ErrorCode::InvalidRoute,
    );

    // No pool for the pair
    assert_error(
        registry.swap_exact_input(&exact_input(&[1, 3], 1_000)),
        ErrorCode::AccountNotFound,
    );

    assert_error(
        registry.swap_exact_input(&exact_input(&[1, 2], 0)),
        ErrorCode::ZeroAmount,
    );

    let mut params = exact_output(&[1, 2], 1_000);
    params.deadline = Some(1009);
    assert_error(registry.swap_exact_output(&params), ErrorCode::DeadlineExceeded);
}

#[test]
fn test_failed_route_changes_no_pool() {
    let mut registry = registry();
    let before_12 = pool(&registry, 1, 2).clone();
    let before_23 = pool(&registry, 2, 3).clone();

    // The empty pool pays nothing, so the minimum cannot be met
    let mut params = exact_input(&[1, 2, 4], 1_000_000);
    params.amount_out_minimum = 1;
    assert_error(registry.swap_exact_input(&params), ErrorCode::SlippageExceeded);

    // Output above the minimum of a later hop
    let mut params = exact_input(&[1, 2, 3], 1_000_000);
    params.amount_out_minimum = 1_000_000;
    assert_error(registry.swap_exact_input(&params), ErrorCode::SlippageExceeded);

    // The empty pool cannot deliver any output
    assert_error(
        registry.swap_exact_output(&exact_output(&[1, 2, 4], 1_000)),
        ErrorCode::SlippageExceeded,
    );

    let mut params = exact_output(&[1, 2, 3], 1_000_000);
    params.amount_in_maximum = 1_000_000;
    assert_error(registry.swap_exact_output(&params), ErrorCode::SlippageExceeded);

    assert_eq!(pool(&registry, 1, 2), &before_12);
    assert_eq!(pool(&registry, 2, 3), &before_23);
}
