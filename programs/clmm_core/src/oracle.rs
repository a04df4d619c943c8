//! Oracle Module for time-weighted average price and liquidity queries
//!
//! Each pool keeps a ring buffer of observations. An observation stores running sums of
//! `tick * seconds` and `liquidity * seconds`, so the average tick over any window that the
//! ring still covers is `(cumulative(t1) - cumulative(t0)) / (t1 - t0)`.
//!
//! The ring starts with a single slot. Growing it only pre-allocates storage; the slots go
//! live one at a time as the write index wraps into them.

use crate::errors::ErrorCode;
use crate::math::full_math::mul_div_floor;
use anchor_lang::prelude::*;

/// Represents a single price observation point
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    /// Timestamp of the observation
    pub block_timestamp: u32,

    /// Running sum of `tick * seconds` since pool creation
    pub tick_cumulative: i64,

    /// Running sum of `liquidity * seconds` since pool creation
    pub liquidity_cumulative: u128,

    /// Whether this observation slot holds data
    pub initialized: bool,
}

impl Observation {
    /// Extends this observation to `block_timestamp`, assuming `tick` and `liquidity`
    /// held over the whole interval.
    pub fn transform(&self, block_timestamp: u32, tick: i32, liquidity: u128) -> Result<Self> {
        let delta = block_timestamp
            .checked_sub(self.block_timestamp)
            .ok_or_else(|| error!(ErrorCode::InvalidObservationSequence))?;
        let tick_cumulative = (tick as i64)
            .checked_mul(delta as i64)
            .and_then(|d| self.tick_cumulative.checked_add(d))
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        let liquidity_cumulative = liquidity
            .checked_mul(delta as u128)
            .and_then(|d| self.liquidity_cumulative.checked_add(d))
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        Ok(Self {
            block_timestamp,
            tick_cumulative,
            liquidity_cumulative,
            initialized: true,
        })
    }
}

/// The storage address of a pre-allocated observation slot, as handed over by the storage
/// collaborator when the ring grows.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservationSlot {
    /// The pool the slot was allocated for
    pub pool: Pubkey,
    /// Position of the slot in the ring
    pub index: u16,
}

/// Cumulative values returned by [`Oracle::observe`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObservationSnapshot {
    pub tick_cumulative: i64,
    pub liquidity_cumulative: u128,
}

impl From<&Observation> for ObservationSnapshot {
    fn from(observation: &Observation) -> Self {
        Self {
            tick_cumulative: observation.tick_cumulative,
            liquidity_cumulative: observation.liquidity_cumulative,
        }
    }
}

/// Oracle structure for storing and managing observations
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Oracle {
    /// The pool this oracle belongs to
    pub pool: Pubkey,

    /// Ring of observations; its length is the number of allocated slots
    pub observations: Vec<Observation>,

    /// Index of the most recently written observation
    pub observation_index: u16,

    /// Number of slots currently in use by the ring
    pub observation_cardinality: u16,

    /// Number of slots the ring will use once the write index wraps
    pub observation_cardinality_next: u16,
}

impl Oracle {
    /// Initialize a new oracle with a single observation
    pub fn new(pool: Pubkey, block_timestamp: u32) -> Self {
        Self {
            pool,
            observations: vec![Observation {
                block_timestamp,
                initialized: true,
                ..Default::default()
            }],
            observation_index: 0,
            observation_cardinality: 1,
            observation_cardinality_next: 1,
        }
    }

    /// Get the most recent observation
    pub fn last_observation(&self) -> &Observation {
        &self.observations[self.observation_index as usize]
    }

    /// Records the state that held since the last observation.
    ///
    /// At most one observation is written per timestamp. When the write index sits on the
    /// last live slot and more slots have been allocated, the ring grows into them.
    ///
    /// # Arguments
    /// * `block_timestamp` - The current time
    /// * `tick` - The tick that held since the last observation
    /// * `liquidity` - The in-range liquidity that held since the last observation
    pub fn write(&mut self, block_timestamp: u32, tick: i32, liquidity: u128) -> Result<()> {
        let last = *self.last_observation();
        if last.block_timestamp == block_timestamp {
            return Ok(());
        }

        let cardinality = if self.observation_cardinality_next > self.observation_cardinality
            && self.observation_index == self.observation_cardinality - 1
        {
            self.observation_cardinality_next
        } else {
            self.observation_cardinality
        };

        let index = (self.observation_index + 1) % cardinality;
        self.observations[index as usize] = last.transform(block_timestamp, tick, liquidity)?;
        self.observation_index = index;
        self.observation_cardinality = cardinality;
        Ok(())
    }

    /// Pre-allocates slots so the ring can reach `next` observations, at most
    /// [`OBSERVATION_CARDINALITY_MAX`](crate::constants::OBSERVATION_CARDINALITY_MAX).
    ///
    /// `slots` must be exactly the new slots, belonging to this pool and numbered
    /// consecutively from the current allocation. Requests at or below the current
    /// allocation are a no-op.
    ///
    /// # Returns
    /// * The cardinality the ring will grow to
    pub fn grow(&mut self, next: u16, slots: &[ObservationSlot]) -> Result<u16> {
        require!(next > 0, ErrorCode::ObservationCardinalityOutOfRange);
        let current = self.observation_cardinality_next;
        if next <= current {
            return Ok(current);
        }

        require!(
            slots.len() == (next - current) as usize,
            ErrorCode::InvalidObservationSequence
        );
        for (offset, slot) in slots.iter().enumerate() {
            require_keys_eq!(slot.pool, self.pool, ErrorCode::InvalidObservationSequence);
            require!(
                slot.index as usize == current as usize + offset,
                ErrorCode::InvalidObservationSequence
            );
        }

        self.observations
            .extend(slots.iter().map(|_| Observation::default()));
        self.observation_cardinality_next = next;
        msg!("Oracle cardinality next: {} -> {}", current, next);
        Ok(next)
    }

    /// Cumulative values at each `now - seconds_ago`.
    ///
    /// Values between two observations are interpolated linearly; values after the newest
    /// observation are extrapolated with the current `tick` and `liquidity`.
    ///
    /// # Errors
    /// * `ObservationTooOld` if a target is older than the oldest observation in the ring
    pub fn observe(
        &self,
        now: u32,
        seconds_agos: &[u32],
        tick: i32,
        liquidity: u128,
    ) -> Result<Vec<ObservationSnapshot>> {
        seconds_agos
            .iter()
            .map(|seconds_ago| self.observe_single(now, *seconds_ago, tick, liquidity))
            .collect()
    }

    pub fn observe_single(
        &self,
        now: u32,
        seconds_ago: u32,
        tick: i32,
        liquidity: u128,
    ) -> Result<ObservationSnapshot> {
        if seconds_ago == 0 {
            let last = self.last_observation();
            let last = if last.block_timestamp != now {
                last.transform(now, tick, liquidity)?
            } else {
                *last
            };
            return Ok((&last).into());
        }

        let target = now
            .checked_sub(seconds_ago)
            .ok_or_else(|| error!(ErrorCode::ObservationTooOld))?;
        let (before, after) = self.get_surrounding_observations(target, tick, liquidity)?;

        if target == before.block_timestamp {
            Ok((&before).into())
        } else if target == after.block_timestamp {
            Ok((&after).into())
        } else {
            let observation_time_delta = (after.block_timestamp - before.block_timestamp) as i64;
            let target_delta = (target - before.block_timestamp) as i64;
            let tick_cumulative = before.tick_cumulative
                + (after.tick_cumulative - before.tick_cumulative) / observation_time_delta
                    * target_delta;
            let liquidity_cumulative = before.liquidity_cumulative
                + mul_div_floor(
                    after.liquidity_cumulative - before.liquidity_cumulative,
                    target_delta as u128,
                    observation_time_delta as u128,
                )?;
            Ok(ObservationSnapshot {
                tick_cumulative,
                liquidity_cumulative,
            })
        }
    }

    /// Get observations that surround the target timestamp
    fn get_surrounding_observations(
        &self,
        target: u32,
        tick: i32,
        liquidity: u128,
    ) -> Result<(Observation, Observation)> {
        let newest = *self.last_observation();
        if newest.block_timestamp <= target {
            if newest.block_timestamp == target {
                return Ok((newest, newest));
            }
            return Ok((newest, newest.transform(target, tick, liquidity)?));
        }

        let cardinality = self.observation_cardinality;
        let mut oldest = self.observations[((self.observation_index + 1) % cardinality) as usize];
        if !oldest.initialized {
            oldest = self.observations[0];
        }
        require!(
            oldest.block_timestamp <= target,
            ErrorCode::ObservationTooOld
        );

        Ok(self.binary_search(target))
    }

    /// Finds the adjacent pair `before <= target <= after` among the live slots.
    ///
    /// Only called when the target lies within the ring, so the search always terminates.
    fn binary_search(&self, target: u32) -> (Observation, Observation) {
        let cardinality = self.observation_cardinality as usize;
        let mut left = (self.observation_index as usize + 1) % cardinality;
        let mut right = left + cardinality - 1;

        loop {
            let i = (left + right) / 2;
            let before = self.observations[i % cardinality];
            if !before.initialized {
                left = i + 1;
                continue;
            }
            let after = self.observations[(i + 1) % cardinality];
            let target_at_or_after = before.block_timestamp <= target;
            if target_at_or_after && target <= after.block_timestamp {
                return (before, after);
            }
            if !target_at_or_after {
                right = i - 1;
            } else {
                left = i + 1;
            }
        }
    }
}

/// Converts a clock reading to the oracle's 32-bit timestamp.
///
/// # Errors
/// * `MathOverflow` past the year 2106
pub fn block_timestamp(now: u64) -> Result<u32> {
    u32::try_from(now).map_err(|_| error!(ErrorCode::MathOverflow))
}
