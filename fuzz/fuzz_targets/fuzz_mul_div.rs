use anchor_lang::error::Error;
use arbitrary::Arbitrary;
use clmm_core::math::{mul_div_ceil, mul_div_floor};
use clmm_core::ErrorCode;
use ethnum::U256;
use honggfuzz::fuzz;

#[derive(Debug, Clone, Arbitrary)]
struct MulDivInput {
    a: u128,
    b: u128,
    denom: u128,
}

#[derive(Debug, Clone, Arbitrary)]
enum MulDivOp {
    Floor,
    Ceil,
}

#[derive(Debug, Clone, Arbitrary)]
struct MulDivTest {
    input: MulDivInput,
    operation: MulDivOp,
}

fn is_error(err: &Error, code: ErrorCode) -> bool {
    matches!(err, Error::AnchorError(details) if details.error_msg == code.to_string())
}

/// Reference result from an independent 256-bit implementation.
fn reference(a: u128, b: u128, denom: u128, round_up: bool) -> Option<u128> {
    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(denom);
    let mut quotient = product / denom;
    if round_up && product % denom != 0 {
        quotient += 1;
    }
    u128::try_from(quotient).ok()
}

fn fuzz_mul_div_operations(test: MulDivTest) {
    let MulDivInput { a, b, denom } = test.input;
    let round_up = matches!(test.operation, MulDivOp::Ceil);
    let result = if round_up {
        mul_div_ceil(a, b, denom)
    } else {
        mul_div_floor(a, b, denom)
    };

    if denom == 0 {
        assert!(is_error(&result.unwrap_err(), ErrorCode::DivisionByZero));
        return;
    }
    match (result, reference(a, b, denom, round_up)) {
        (Ok(value), Some(expected)) => assert_eq!(value, expected),
        (Err(err), None) => assert!(is_error(&err, ErrorCode::MathOverflow)),
        (result, expected) => panic!("{result:?} disagrees with {expected:?}"),
    }

    // Floor and ceiling differ by at most one
    if let (Ok(floor), Ok(ceil)) = (mul_div_floor(a, b, denom), mul_div_ceil(a, b, denom)) {
        assert!(ceil >= floor && ceil - floor <= 1);
    }
}

fn main() {
    loop {
        fuzz!(|data: MulDivTest| {
            fuzz_mul_div_operations(data);
        });
    }
}
