use arbitrary::{Arbitrary, Unstructured};
use clmm_core::constants::{MAX_FEE_RATE, MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use clmm_core::math::compute_swap_step;
use honggfuzz::fuzz;

#[derive(Debug, Clone)]
struct SwapStepInput {
    sqrt_price_current: u128,
    sqrt_price_target: u128,
    liquidity: u128,
    amount_remaining: i64,
    fee_rate: u32,
}

impl<'a> Arbitrary<'a> for SwapStepInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(SwapStepInput {
            sqrt_price_current: u.int_in_range(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64 - 1)?,
            sqrt_price_target: u.int_in_range(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64 - 1)?,
            liquidity: u.arbitrary()?,
            amount_remaining: u.arbitrary()?,
            fee_rate: u.int_in_range(0..=MAX_FEE_RATE)?,
        })
    }
}

fn fuzz_swap_step(input: SwapStepInput) {
    let SwapStepInput {
        sqrt_price_current,
        sqrt_price_target,
        liquidity,
        amount_remaining,
        fee_rate,
    } = input;

    // Amounts beyond u64 are reported, not wrapped
    let Ok(step) = compute_swap_step(
        sqrt_price_current,
        sqrt_price_target,
        liquidity,
        amount_remaining,
        fee_rate,
    ) else {
        return;
    };

    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    if zero_for_one {
        assert!(step.sqrt_price_next_x64 <= sqrt_price_current);
        assert!(step.sqrt_price_next_x64 >= sqrt_price_target);
    } else {
        assert!(step.sqrt_price_next_x64 >= sqrt_price_current);
        assert!(step.sqrt_price_next_x64 <= sqrt_price_target);
    }

    let budget = amount_remaining.unsigned_abs();
    let reached_target = step.sqrt_price_next_x64 == sqrt_price_target;
    if amount_remaining >= 0 {
        let spent = step.amount_in as u128 + step.fee_amount as u128;
        assert!(spent <= budget as u128);
        if !reached_target {
            assert_eq!(spent, budget as u128);
        }
    } else {
        assert!(step.amount_out <= budget);
    }

    // No price movement means nothing traded
    if step.sqrt_price_next_x64 == sqrt_price_current {
        assert_eq!(step.amount_out, 0);
    }
}

fn main() {
    loop {
        fuzz!(|data: SwapStepInput| {
            fuzz_swap_step(data);
        });
    }
}
