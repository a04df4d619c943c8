//! Property-based tests for the fixed-point math
//!
//! These check the rounding and monotonicity guarantees the pool relies on over randomly
//! generated inputs, rather than fixed vectors.

use crate::constants::*;
use crate::math::*;
use proptest::prelude::*;

/// Defines strategies for generating valid inputs for testing
mod strategies {
    use super::*;

    pub fn tick() -> impl Strategy<Value = i32> {
        MIN_TICK..MAX_TICK
    }

    /// Ticks where a price ratio of at most about 150 keeps every amount within u64
    pub fn moderate_tick() -> impl Strategy<Value = i32> {
        -50_000..50_000i32
    }

    pub fn sqrt_price() -> impl Strategy<Value = u128> {
        MIN_SQRT_PRICE_X64..MAX_SQRT_PRICE_X64
    }

    pub fn liquidity() -> impl Strategy<Value = u128> {
        1..(1u128 << 96)
    }

    /// Deep enough that no `amount()` trade pushes a moderate price out of bounds
    pub fn deep_liquidity() -> impl Strategy<Value = u128> {
        (1u128 << 64)..(1u128 << 96)
    }

    pub fn amount() -> impl Strategy<Value = u64> {
        1..(1u64 << 56)
    }

    /// Up to 10%
    pub fn fee_rate() -> impl Strategy<Value = u32> {
        0..100_000u32
    }
}

proptest! {
    // Tick math

    #[test]
    fn test_tick_round_trip(tick in strategies::tick()) {
        let sqrt_price = get_sqrt_price_at_tick(tick).unwrap();
        prop_assert_eq!(get_tick_at_sqrt_price(sqrt_price).unwrap(), tick);
        prop_assert!(get_sqrt_price_at_tick(tick + 1).unwrap() > sqrt_price);
    }

    #[test]
    fn test_tick_at_price_brackets_price(sqrt_price in strategies::sqrt_price()) {
        let tick = get_tick_at_sqrt_price(sqrt_price).unwrap();
        prop_assert!(get_sqrt_price_at_tick(tick).unwrap() <= sqrt_price);
        prop_assert!(get_sqrt_price_at_tick(tick + 1).unwrap() > sqrt_price);
    }

    // Full math

    #[test]
    fn test_mul_div_rounding_gap(a in any::<u64>(), b in any::<u64>(), denom in 1..u64::MAX) {
        let floor = mul_div_floor(a as u128, b as u128, denom as u128).unwrap();
        let ceil = mul_div_ceil(a as u128, b as u128, denom as u128).unwrap();
        prop_assert!(ceil >= floor);
        prop_assert!(ceil - floor <= 1);
        let exact = (a as u128 * b as u128) % denom as u128 == 0;
        prop_assert_eq!(ceil == floor, exact);
    }

    // Amount deltas

    #[test]
    fn test_amount_delta_rounding(
        tick_a in strategies::moderate_tick(),
        tick_b in strategies::moderate_tick(),
        liquidity in strategies::liquidity(),
    ) {
        let sqrt_a = get_sqrt_price_at_tick(tick_a).unwrap();
        let sqrt_b = get_sqrt_price_at_tick(tick_b).unwrap();
        let liquidity = liquidity >> 40;

        let up_0 = get_amount_0_delta(sqrt_a, sqrt_b, liquidity, true).unwrap();
        let down_0 = get_amount_0_delta(sqrt_a, sqrt_b, liquidity, false).unwrap();
        prop_assert!(up_0 >= down_0 && up_0 - down_0 <= 1);

        let up_1 = get_amount_1_delta(sqrt_a, sqrt_b, liquidity, true).unwrap();
        let down_1 = get_amount_1_delta(sqrt_a, sqrt_b, liquidity, false).unwrap();
        prop_assert!(up_1 >= down_1 && up_1 - down_1 <= 1);
    }

    #[test]
    fn test_next_price_moves_with_trade(
        tick in strategies::moderate_tick(),
        liquidity in strategies::deep_liquidity(),
        amount in strategies::amount(),
    ) {
        let sqrt_price = get_sqrt_price_at_tick(tick).unwrap();

        // Selling token0 lowers the price, selling token1 raises it
        let after_0 = get_next_sqrt_price_from_input(sqrt_price, liquidity, amount, true).unwrap();
        prop_assert!(after_0 <= sqrt_price);
        let after_1 = get_next_sqrt_price_from_input(sqrt_price, liquidity, amount, false).unwrap();
        prop_assert!(after_1 >= sqrt_price);

        // The input actually needed for the move never exceeds what was offered
        let needed_0 = get_amount_0_delta(after_0, sqrt_price, liquidity, true).unwrap();
        prop_assert!(needed_0 <= amount);
        let needed_1 = get_amount_1_delta(sqrt_price, after_1, liquidity, true).unwrap();
        prop_assert!(needed_1 <= amount);
    }

    // Liquidity solvers

    #[test]
    fn test_liquidity_never_costs_more_than_budget(
        tick_current in strategies::moderate_tick(),
        tick_a in strategies::moderate_tick(),
        tick_b in strategies::moderate_tick(),
        amount_0 in strategies::amount(),
        amount_1 in strategies::amount(),
    ) {
        prop_assume!(tick_a != tick_b);
        let sqrt_current = get_sqrt_price_at_tick(tick_current).unwrap();
        let sqrt_a = get_sqrt_price_at_tick(tick_a).unwrap();
        let sqrt_b = get_sqrt_price_at_tick(tick_b).unwrap();

        let liquidity =
            get_liquidity_for_amounts(sqrt_current, sqrt_a, sqrt_b, amount_0, amount_1, true)
                .unwrap();
        let (cost_0, cost_1) =
            get_amounts_for_liquidity(sqrt_current, sqrt_a, sqrt_b, liquidity, true).unwrap();
        prop_assert!(cost_0 <= amount_0);
        prop_assert!(cost_1 <= amount_1);
    }

    #[test]
    fn test_add_delta_inverts(liquidity in any::<u64>(), delta in any::<i64>()) {
        let liquidity = liquidity as u128;
        let delta = delta as i128;
        match add_delta(liquidity, delta) {
            Ok(next) => prop_assert_eq!(add_delta(next, -delta).unwrap(), liquidity),
            Err(_) => prop_assert!(delta < 0 && delta.unsigned_abs() > liquidity),
        }
    }

    // Swap step

    #[test]
    fn test_exact_input_step_spends_at_most_budget(
        tick_current in strategies::moderate_tick(),
        tick_target in strategies::moderate_tick(),
        liquidity in strategies::liquidity(),
        amount in strategies::amount(),
        fee_rate in strategies::fee_rate(),
    ) {
        let sqrt_current = get_sqrt_price_at_tick(tick_current).unwrap();
        let sqrt_target = get_sqrt_price_at_tick(tick_target).unwrap();
        let step = compute_swap_step(sqrt_current, sqrt_target, liquidity, amount as i64, fee_rate)
            .unwrap();

        prop_assert!(step.amount_in + step.fee_amount <= amount);
        // The price ends between the start and the target
        let (low, high) = (sqrt_current.min(sqrt_target), sqrt_current.max(sqrt_target));
        prop_assert!(step.sqrt_price_next_x64 >= low && step.sqrt_price_next_x64 <= high);
        // Stopping short of the target means the whole budget was used
        if step.sqrt_price_next_x64 != sqrt_target {
            prop_assert_eq!(step.amount_in + step.fee_amount, amount);
        }
    }

    #[test]
    fn test_exact_output_step_never_overpays(
        tick_current in strategies::moderate_tick(),
        tick_target in strategies::moderate_tick(),
        liquidity in strategies::liquidity(),
        amount in strategies::amount(),
        fee_rate in strategies::fee_rate(),
    ) {
        let sqrt_current = get_sqrt_price_at_tick(tick_current).unwrap();
        let sqrt_target = get_sqrt_price_at_tick(tick_target).unwrap();
        let step = compute_swap_step(
            sqrt_current,
            sqrt_target,
            liquidity >> 32,
            -(amount as i64),
            fee_rate,
        )
        .unwrap();

        prop_assert!(step.amount_out <= amount);
        if step.sqrt_price_next_x64 != sqrt_target {
            prop_assert_eq!(step.amount_out, amount);
        }
    }
}
