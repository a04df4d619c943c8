/// Defines the state and basic logic for individual initialized ticks.
///
/// The price range is divided into discrete ticks. A tick record exists while at least one
/// position uses it as a boundary. It stores how much liquidity references it and the fee
/// and reward growth that happened on the "outside" of it, which is what lets any range
/// compute its own earnings without iterating swaps.
use crate::constants::{MAX_TICK, MIN_TICK, REWARD_NUM};
use crate::errors::ErrorCode;
use crate::math::liquidity_math::add_delta;
use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

/// Represents the state of an initialized tick.
///
/// The layout is plain old data so storage collaborators can map it without copying.
#[repr(C)]
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Pod, Zeroable, AnchorSerialize, AnchorDeserialize,
)]
pub struct TickState {
    /// total liquidity referencing this tick      (offset 0)
    pub liquidity_gross: u128,
    /// net liquidity added when crossed upward     (offset 16)
    pub liquidity_net: i128,
    /// token0 fee growth on the other side of this tick, Q64.64 per unit liquidity
    pub fee_growth_outside_0_x64: u128,
    /// token1 fee growth on the other side of this tick, Q64.64 per unit liquidity
    pub fee_growth_outside_1_x64: u128,
    /// reward growth on the other side of this tick, per reward slot
    pub reward_growths_outside_x64: [u128; REWARD_NUM],
    /// the tick index                              (offset 112)
    pub tick: i32,
    pub _padding: [u8; 12],
}

impl TickState {
    /// Size of the record: 7 * 16 + 4 + 12 = 128 bytes.
    pub const LEN: usize = 128;

    /// A fresh, uninitialized record for `tick`.
    pub fn new(tick: i32) -> Self {
        Self {
            tick,
            ..Self::zeroed()
        }
    }

    /// Whether any position references this tick.
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }

    /// Updates the tick when a position using it as a boundary changes liquidity.
    ///
    /// Growth outside a tick is, by convention, all growth so far when the tick is
    /// initialized at or below the current tick.
    ///
    /// # Arguments
    /// * `tick_current` - The pool's current tick
    /// * `liquidity_delta` - Liquidity added (positive) or removed (negative)
    /// * `fee_growth_global_0_x64` / `fee_growth_global_1_x64` - Current global fee growth
    /// * `reward_growths_global_x64` - Current global reward growth per slot
    /// * `upper` - Whether this tick is the upper boundary of the position
    /// * `max_liquidity` - Cap on gross liquidity for this pool's tick spacing
    ///
    /// # Returns
    /// * `true` if the tick flipped between initialized and uninitialized
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global_0_x64: u128,
        fee_growth_global_1_x64: u128,
        reward_growths_global_x64: &[u128; REWARD_NUM],
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool> {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after = add_delta(liquidity_gross_before, liquidity_delta)?;
        require!(
            liquidity_gross_after <= max_liquidity,
            ErrorCode::TickLiquidityLimitExceeded
        );

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        if liquidity_gross_before == 0 && self.tick <= tick_current {
            self.fee_growth_outside_0_x64 = fee_growth_global_0_x64;
            self.fee_growth_outside_1_x64 = fee_growth_global_1_x64;
            self.reward_growths_outside_x64 = *reward_growths_global_x64;
        }

        self.liquidity_gross = liquidity_gross_after;
        self.liquidity_net = if upper {
            self.liquidity_net.checked_sub(liquidity_delta)
        } else {
            self.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or_else(|| error!(ErrorCode::LiquidityOverflow))?;

        Ok(flipped)
    }

    /// Transitions to the other side of the tick during a swap.
    ///
    /// Returns the liquidity to add when moving upward.
    pub fn cross(
        &mut self,
        fee_growth_global_0_x64: u128,
        fee_growth_global_1_x64: u128,
        reward_growths_global_x64: &[u128; REWARD_NUM],
    ) -> i128 {
        self.fee_growth_outside_0_x64 =
            fee_growth_global_0_x64.wrapping_sub(self.fee_growth_outside_0_x64);
        self.fee_growth_outside_1_x64 =
            fee_growth_global_1_x64.wrapping_sub(self.fee_growth_outside_1_x64);
        for (outside, global) in self
            .reward_growths_outside_x64
            .iter_mut()
            .zip(reward_growths_global_x64.iter())
        {
            *outside = global.wrapping_sub(*outside);
        }
        self.liquidity_net
    }
}

/// Growth accumulated strictly inside `[tick_lower, tick_upper)`.
///
/// `inside = global - below - above`, where the growth below the lower tick is its outside
/// value when the current tick is at or above it and the complement otherwise (and
/// symmetrically above). Differences are modular: only deltas between two snapshots carry
/// meaning.
pub fn growth_inside(
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    global: u128,
    lower_outside: u128,
    upper_outside: u128,
) -> u128 {
    let below = if tick_current >= tick_lower {
        lower_outside
    } else {
        global.wrapping_sub(lower_outside)
    };
    let above = if tick_current < tick_upper {
        upper_outside
    } else {
        global.wrapping_sub(upper_outside)
    };
    global.wrapping_sub(below).wrapping_sub(above)
}

/// Fee growth inside a position's range for both tokens.
pub fn get_fee_growth_inside(
    tick_lower: &TickState,
    tick_upper: &TickState,
    tick_current: i32,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
) -> (u128, u128) {
    (
        growth_inside(
            tick_lower.tick,
            tick_upper.tick,
            tick_current,
            fee_growth_global_0_x64,
            tick_lower.fee_growth_outside_0_x64,
            tick_upper.fee_growth_outside_0_x64,
        ),
        growth_inside(
            tick_lower.tick,
            tick_upper.tick,
            tick_current,
            fee_growth_global_1_x64,
            tick_lower.fee_growth_outside_1_x64,
            tick_upper.fee_growth_outside_1_x64,
        ),
    )
}

/// Reward growth inside a position's range, per reward slot.
pub fn get_reward_growths_inside(
    tick_lower: &TickState,
    tick_upper: &TickState,
    tick_current: i32,
    reward_growths_global_x64: &[u128; REWARD_NUM],
) -> [u128; REWARD_NUM] {
    let mut inside = [0u128; REWARD_NUM];
    for (i, slot) in inside.iter_mut().enumerate() {
        *slot = growth_inside(
            tick_lower.tick,
            tick_upper.tick,
            tick_current,
            reward_growths_global_x64[i],
            tick_lower.reward_growths_outside_x64[i],
            tick_upper.reward_growths_outside_x64[i],
        );
    }
    inside
}

/// Validates a position's boundaries against the pool's tick spacing.
///
/// # Errors
/// * `InvalidTickRange` if `tick_lower >= tick_upper`
/// * `TickOutOfRange` if either tick is outside `[MIN_TICK, MAX_TICK]`
/// * `TickNotAligned` if either tick is not a multiple of the spacing
pub fn check_ticks(tick_lower: i32, tick_upper: i32, tick_spacing: u16) -> Result<()> {
    require!(tick_spacing > 0, ErrorCode::InvalidTickSpacing);
    require!(tick_lower < tick_upper, ErrorCode::InvalidTickRange);
    require!(tick_lower >= MIN_TICK, ErrorCode::TickOutOfRange);
    require!(tick_upper <= MAX_TICK, ErrorCode::TickOutOfRange);
    let spacing = tick_spacing as i32;
    require!(
        tick_lower % spacing == 0 && tick_upper % spacing == 0,
        ErrorCode::TickNotAligned
    );
    Ok(())
}

/// Largest gross liquidity a single tick may hold for a spacing.
///
/// Spreading `u128::MAX` evenly over every usable tick keeps the in-range liquidity sum
/// representable no matter how positions are laid out.
pub fn max_liquidity_per_tick(tick_spacing: u16) -> u128 {
    let spacing = tick_spacing.max(1) as i32;
    let min_tick = (MIN_TICK / spacing) * spacing;
    let max_tick = (MAX_TICK / spacing) * spacing;
    let num_ticks = ((max_tick - min_tick) / spacing) as u128 + 1;
    u128::MAX / num_ticks
}
