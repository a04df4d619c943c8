//! Full-precision multiply-divide.
//!
//! `a * b / denom` is evaluated with an intermediate twice as wide as the operands, then
//! rounded in the requested direction. These helpers are the only place the double-width
//! intermediate is touched; every price, amount and growth formula in the crate goes
//! through them so that rounding stays auditable.

use crate::errors::ErrorCode;
use anchor_lang::prelude::*;
use primitive_types::{U256, U512};

/// Widens a 256-bit value into the 512-bit intermediate.
fn widen(value: U256) -> U512 {
    let U256(words) = value;
    U512([words[0], words[1], words[2], words[3], 0, 0, 0, 0])
}

/// Narrows a 512-bit value back to 256 bits, failing if any high word is set.
fn narrow(value: U512) -> Result<U256> {
    let U512(words) = value;
    if words[4..].iter().any(|word| *word != 0) {
        return err!(ErrorCode::MathOverflow);
    }
    Ok(U256([words[0], words[1], words[2], words[3]]))
}

/// Converts a 256-bit intermediate into `u128`.
pub fn u256_to_u128(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return err!(ErrorCode::MathOverflow);
    }
    Ok(value.as_u128())
}

/// Converts a 256-bit intermediate into a `u64` token amount.
pub fn u256_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return err!(ErrorCode::MathOverflow);
    }
    Ok(value.as_u64())
}

/// `floor(a * b / denom)` over 256-bit operands with a 512-bit intermediate.
pub fn mul_div_floor_u256(a: U256, b: U256, denom: U256) -> Result<U256> {
    require!(!denom.is_zero(), ErrorCode::DivisionByZero);
    narrow(widen(a) * widen(b) / widen(denom))
}

/// `ceil(a * b / denom)` over 256-bit operands with a 512-bit intermediate.
pub fn mul_div_ceil_u256(a: U256, b: U256, denom: U256) -> Result<U256> {
    require!(!denom.is_zero(), ErrorCode::DivisionByZero);
    let product = widen(a) * widen(b);
    let denom = widen(denom);
    let mut quotient = product / denom;
    if !(product % denom).is_zero() {
        quotient = quotient + U512::one();
    }
    narrow(quotient)
}

/// `ceil(a / b)` for 256-bit operands.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256> {
    require!(!b.is_zero(), ErrorCode::DivisionByZero);
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or_else(|| error!(ErrorCode::MathOverflow))
    }
}

/// `floor(a * b / denom)` for `u128` operands.
///
/// # Errors
/// * `DivisionByZero` when `denom == 0`
/// * `MathOverflow` when the quotient does not fit in `u128`
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128> {
    require!(denom != 0, ErrorCode::DivisionByZero);
    u256_to_u128(U256::from(a) * U256::from(b) / U256::from(denom))
}

/// `ceil(a * b / denom)` for `u128` operands.
pub fn mul_div_ceil(a: u128, b: u128, denom: u128) -> Result<u128> {
    require!(denom != 0, ErrorCode::DivisionByZero);
    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(denom);
    let mut quotient = product / denom;
    if !(product % denom).is_zero() {
        quotient = quotient + U256::one();
    }
    u256_to_u128(quotient)
}

/// `a * b / denom` with the rounding direction chosen by the caller.
///
/// Amounts a user pays in are computed with `round_up = true`, amounts paid out with
/// `round_up = false`.
pub fn mul_div_rounding_up(a: u128, b: u128, denom: u128, round_up: bool) -> Result<u128> {
    if round_up {
        mul_div_ceil(a, b, denom)
    } else {
        mul_div_floor(a, b, denom)
    }
}
