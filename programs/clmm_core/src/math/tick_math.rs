//! Conversion between tick indices and Q64.64 square-root prices.
//!
//! `sqrt(1.0001^tick)` is evaluated by binary exponentiation over a table of Q128.128
//! constants, one per bit of `|tick|`, so that every implementation produces the same
//! bits without calling a transcendental function. The inverse recovers the tick from a
//! base-2 logarithm of the price and resolves the approximation error by checking the two
//! candidate ticks against the forward conversion.

use crate::constants::{MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK};
use crate::errors::ErrorCode;
use crate::math::full_math::u256_to_u128;
use anchor_lang::prelude::*;
use primitive_types::U256;

/// `2^128 / 1.0001^(2^i / 2)` for `i = 0..19`, in Q128.128.
const SQRT_RATIO_MAGIC_X128: [u128; 19] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x09aa508b5b7a84e1c677de54f3e99bc9,
    0x005d6af8dedb81196699c329225ee604,
    0x00002216e584f5fa1ea926041bedfe98,
];

/// Fractional bits resolved by the binary logarithm in `get_tick_at_sqrt_price`.
///
/// 16 bits keep the error below one tick: `2^-16 / log2(sqrt(1.0001)) < 1`.
const LOG2_PRECISION_BITS: u32 = 16;

/// `2^32 / log2(sqrt(1.0001))`, converts a Q32 log2 into a Q64 log base sqrt(1.0001).
const LOG_SQRT_10001_CHANGE_OF_BASE: i128 = 59543866431248;

/// 0.01 in Q64, subtracted to get the lower candidate tick.
const TICK_LOW_ERROR_X64: i128 = 184467440737095516;

/// `2^-14 / log2(sqrt(1.0001)) + 0.01` in Q64, added to get the upper candidate tick.
const TICK_HIGH_ERROR_X64: i128 = 15793534762490258745;

/// Calculates `sqrt(1.0001^tick) * 2^64`.
///
/// # Arguments
/// * `tick` - Tick index in `[MIN_TICK, MAX_TICK]`
///
/// # Returns
/// * The Q64.64 square-root price, rounded up so that
///   `get_tick_at_sqrt_price(get_sqrt_price_at_tick(t)) == t`
///
/// # Errors
/// * `TickOutOfRange` if the tick is outside the legal range
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<u128> {
    require!(
        (MIN_TICK..=MAX_TICK).contains(&tick),
        ErrorCode::TickOutOfRange
    );
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(SQRT_RATIO_MAGIC_X128[0])
    } else {
        U256::one() << 128
    };
    for (bit, magic) in SQRT_RATIO_MAGIC_X128.iter().enumerate().skip(1) {
        if abs_tick & (1u32 << bit) != 0 {
            ratio = (ratio * U256::from(*magic)) >> 128;
        }
    }

    // The table holds reciprocals, so positive ticks need the inversion.
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.64, rounding up.
    let truncated = ratio >> 64;
    let remainder = ratio & U256::from(u64::MAX);
    let sqrt_price = if remainder.is_zero() {
        truncated
    } else {
        truncated + U256::one()
    };
    u256_to_u128(sqrt_price)
}

/// Calculates the greatest tick such that `get_sqrt_price_at_tick(tick) <= sqrt_price_x64`.
///
/// # Arguments
/// * `sqrt_price_x64` - Q64.64 price in `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64)`
///
/// # Errors
/// * `PriceOutOfRange` if the price is outside the legal range
pub fn get_tick_at_sqrt_price(sqrt_price_x64: u128) -> Result<i32> {
    require!(
        (MIN_SQRT_PRICE_X64..MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64),
        ErrorCode::PriceOutOfRange
    );

    // Integer part of log2 from the most significant bit.
    let msb: u32 = 127 - sqrt_price_x64.leading_zeros();
    let log2_integer_x32 = (msb as i128 - 64) << 32;

    // Normalise into Q1.63 and square repeatedly; each overflow past 2.0 is one more bit.
    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };
    let mut bit: i128 = 0x8000_0000_0000_0000;
    let mut log2_fraction_x64: i128 = 0;
    for _ in 0..LOG2_PRECISION_BITS {
        r *= r;
        let is_r_more_than_two = r >> 127;
        r >>= 63 + is_r_more_than_two as u32;
        log2_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
    }

    let log2_x32 = log2_integer_x32 + (log2_fraction_x64 >> 32);
    let log_sqrt_10001_x64 = log2_x32 * LOG_SQRT_10001_CHANGE_OF_BASE;

    let tick_low = ((log_sqrt_10001_x64 - TICK_LOW_ERROR_X64) >> 64) as i32;
    let tick_high = ((log_sqrt_10001_x64 + TICK_HIGH_ERROR_X64) >> 64) as i32;

    if tick_low == tick_high {
        Ok(tick_low)
    } else if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x64 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}
