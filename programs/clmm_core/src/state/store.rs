//! In-memory storage for pools.
//!
//! [`PoolStore`] keeps every record of one pool under the keys the engine addresses them
//! by. [`PoolRegistry`] holds the pools of a deployment, one per ordered pair and fee tier,
//! together with the shared [`AmmConfig`].

use crate::config::AmmConfig;
use crate::errors::ErrorCode;
use crate::events::EventLog;
use crate::oracle::{block_timestamp, ObservationSnapshot, Oracle};
use crate::position::{PersonalPosition, ProtocolPosition};
use crate::staging::{Changeset, PoolTransaction};
use crate::state::pool::{InitializePoolParams, Pool, PoolKey};
use crate::tick::TickState;
use crate::tick_bitmap::TickBitmap;
use anchor_lang::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// All records of a single pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStore {
    pub pool: Pool,
    /// Initialized ticks by index
    pub ticks: BTreeMap<i32, TickState>,
    pub tick_bitmap: TickBitmap,
    /// Aggregate positions by `(tick_lower, tick_upper)`
    pub protocol_positions: BTreeMap<(i32, i32), ProtocolPosition>,
    /// Owner-facing positions by id
    pub personal_positions: HashMap<Pubkey, PersonalPosition>,
    pub oracle: Oracle,
    /// Events of every committed operation, oldest first
    pub events: EventLog,
}

impl PoolStore {
    /// A store holding a freshly initialized pool and nothing else.
    pub fn new(pool: Pool, oracle: Oracle) -> Self {
        Self {
            pool,
            oracle,
            ..Default::default()
        }
    }

    /// Runs `operation` on a staged view of this pool and applies its writes only if it
    /// succeeds.
    pub fn transact<T, F>(&mut self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut PoolTransaction) -> Result<T>,
    {
        let (value, changeset) = {
            let mut tx = PoolTransaction::new(self);
            let value = operation(&mut tx)?;
            (value, tx.commit())
        };
        self.apply(changeset);
        Ok(value)
    }

    /// Writes a committed changeset.
    pub fn apply(&mut self, changeset: Changeset) {
        self.pool = changeset.pool;
        for (index, tick) in changeset.ticks {
            match tick {
                Some(tick) => self.ticks.insert(index, tick),
                None => self.ticks.remove(&index),
            };
        }
        for (word_pos, word) in changeset.bitmap_words {
            self.tick_bitmap.set_word(word_pos, word);
        }
        for (range, position) in changeset.protocol_positions {
            match position {
                Some(position) => self.protocol_positions.insert(range, position),
                None => self.protocol_positions.remove(&range),
            };
        }
        for (id, position) in changeset.personal_positions {
            match position {
                Some(position) => self.personal_positions.insert(id, position),
                None => self.personal_positions.remove(&id),
            };
        }
        if let Some(oracle) = changeset.oracle {
            self.oracle = oracle;
        }
        self.events.extend(changeset.events);
    }

    /// Cumulative tick and liquidity at each `now - seconds_ago`, for time-weighted averages.
    ///
    /// # Errors
    /// * `ObservationTooOld` if a target precedes the oldest stored observation
    pub fn observe(&self, now: u64, seconds_agos: &[u32]) -> Result<Vec<ObservationSnapshot>> {
        self.oracle.observe(
            block_timestamp(now)?,
            seconds_agos,
            self.pool.current_tick,
            self.pool.liquidity,
        )
    }

    pub fn tick(&self, index: i32) -> Option<&TickState> {
        self.ticks.get(&index)
    }

    pub fn protocol_position(&self, tick_lower: i32, tick_upper: i32) -> Option<&ProtocolPosition> {
        self.protocol_positions.get(&(tick_lower, tick_upper))
    }

    /// # Errors
    /// * `AccountNotFound` if no such position exists
    pub fn personal_position(&self, position_id: &Pubkey) -> Result<&PersonalPosition> {
        self.personal_positions
            .get(position_id)
            .ok_or_else(|| error!(ErrorCode::AccountNotFound))
    }
}

/// The pools of a deployment and their shared configuration.
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    pub config: AmmConfig,
    pools: BTreeMap<PoolKey, PoolStore>,
}

impl PoolRegistry {
    pub fn new(config: AmmConfig) -> Self {
        Self {
            config,
            pools: BTreeMap::new(),
        }
    }

    /// # Errors
    /// * `AccountNotFound` if no pool exists under `key`
    pub fn pool(&self, key: &PoolKey) -> Result<&PoolStore> {
        self.pools
            .get(key)
            .ok_or_else(|| error!(ErrorCode::AccountNotFound))
    }

    pub fn pool_mut(&mut self, key: &PoolKey) -> Result<&mut PoolStore> {
        self.pools
            .get_mut(key)
            .ok_or_else(|| error!(ErrorCode::AccountNotFound))
    }

    pub fn pools(&self) -> impl Iterator<Item = (&PoolKey, &PoolStore)> {
        self.pools.iter()
    }

    /// Creates a pool under its pair and fee tier.
    ///
    /// # Errors
    /// * `AccountAlreadyExists` if the pair already has a pool at this fee
    /// * any error of [`PoolStore::initialize`]
    pub fn create_pool(&mut self, params: &InitializePoolParams, now: u64) -> Result<&mut PoolStore> {
        let key = PoolKey::new(params.token0_mint, params.token1_mint, params.fee_rate);
        require!(
            !self.pools.contains_key(&key),
            ErrorCode::AccountAlreadyExists
        );
        let store = PoolStore::initialize(&self.config, params, now)?;
        Ok(self.pools.entry(key).or_insert(store))
    }

    /// Applies the changesets of several pools, all or none.
    pub(crate) fn apply_all(&mut self, changesets: Vec<(PoolKey, Changeset)>) -> Result<()> {
        for (key, _) in &changesets {
            require!(self.pools.contains_key(key), ErrorCode::AccountNotFound);
        }
        for (key, changeset) in changesets {
            if let Some(store) = self.pools.get_mut(&key) {
                store.apply(changeset);
            }
        }
        Ok(())
    }
}
