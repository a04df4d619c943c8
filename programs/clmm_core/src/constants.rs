/// CLMM Core Protocol Constants
///
/// This module defines the numeric boundaries and default parameters that govern the
/// engine. Every price and growth accumulator is a Q64.64 fixed-point value, so the
/// bounds below are expressed at that width.
///
/// The minimum tick index supported by the engine
///
/// At this tick the price is roughly 2^-64, the smallest price whose square root
/// still has 32 significant bits in Q64.64.
pub const MIN_TICK: i32 = -443636;

/// The maximum tick index supported by the engine
///
/// Symmetric to `MIN_TICK`; the price is roughly 2^64.
pub const MAX_TICK: i32 = -MIN_TICK;

/// The sqrt price at `MIN_TICK`, i.e. `get_sqrt_price_at_tick(MIN_TICK)`.
pub const MIN_SQRT_PRICE_X64: u128 = 4295048017;

/// The sqrt price at `MAX_TICK`, i.e. `get_sqrt_price_at_tick(MAX_TICK)`.
///
/// Prices are valid in `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64)`.
pub const MAX_SQRT_PRICE_X64: u128 = 79226673515401279992447579062;

/// Number of fractional bits in the fixed-point formats.
pub const RESOLUTION: u8 = 64;

/// 1.0 in Q64.64.
pub const Q64: u128 = 1u128 << RESOLUTION;

/// Fee rates and the protocol share are expressed in parts per million.
pub const FEE_RATE_DENOMINATOR: u32 = 1_000_000;

/// Largest legal swap fee (exclusive upper bound is the denominator itself).
pub const MAX_FEE_RATE: u32 = FEE_RATE_DENOMINATOR - 1;

/// Default share of each swap fee diverted to the protocol (12%).
pub const DEFAULT_PROTOCOL_FEE_RATE: u32 = 120_000;

/// Standard fee tiers (parts per million) and their tick spacing
///
/// Lowest tier (0.01%), for pegged pairs.
pub const FEE_TIER_LOWEST: u32 = 100;
pub const TICK_SPACING_LOWEST: u16 = 1;

/// Low tier (0.05%), for correlated pairs.
pub const FEE_TIER_LOW: u32 = 500;
pub const TICK_SPACING_LOW: u16 = 10;

/// Medium tier (0.3%), the general purpose default.
pub const FEE_TIER_MEDIUM: u32 = 3000;
pub const TICK_SPACING_MEDIUM: u16 = 60;

/// High tier (1%), for exotic pairs.
pub const FEE_TIER_HIGH: u32 = 10_000;
pub const TICK_SPACING_HIGH: u16 = 200;

/// Number of ticks tracked by a single bitmap word.
pub const TICK_ARRAY_WORD_BITS: i32 = 256;

/// Number of independent reward emission slots per pool.
pub const REWARD_NUM: usize = 3;

/// Upper bound on the oracle ring size.
pub const OBSERVATION_CARDINALITY_MAX: u16 = u16::MAX;
