//! Concentrated liquidity AMM engine.
//!
//! Prices swaps over a curve split into ticks, tracks liquidity per price range, accrues
//! swap fees and liquidity mining rewards per unit of liquidity, and keeps a cumulative
//! price oracle. All arithmetic is deterministic Q64.64 fixed point, so a settlement program
//! and an off-chain simulator reach the same result bit for bit.
//!
//! Pools live in a [`state::PoolStore`]; every operation is staged on a
//! [`staging::PoolTransaction`] and only committed when it succeeds.
#![allow(unexpected_cfgs)]

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod oracle;
pub mod position;
pub mod reward;
pub mod staging;
pub mod state;
pub mod tick;
pub mod tick_bitmap;

pub use config::AmmConfig;
pub use errors::{error_kind, ErrorCode, ErrorKind};
pub use instructions::decrease_liquidity::DecreaseLiquidityParams;
pub use instructions::increase_liquidity::{IncreaseLiquidityParams, LiquidityResult};
pub use instructions::route::{ExactInputParams, ExactOutputParams, RouteResult, SwapPath};
pub use instructions::swap::{SwapParams, SwapResult};
pub use state::{InitializePoolParams, Pool, PoolKey, PoolRegistry, PoolStore};

#[cfg(test)]
mod unit_test;

#[cfg(test)]
mod property_based_test;
