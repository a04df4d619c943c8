//! Staged mutation of a pool.
//!
//! Every operation runs against a [`PoolTransaction`]: a read-through overlay on top of a
//! borrowed [`PoolStore`]. Reads consult the overlay first and fall back to the store, writes
//! only ever touch the overlay. When the operation succeeds the overlay is turned into a
//! [`Changeset`] and applied in one step; when it fails the overlay is dropped and the store
//! is exactly as it was.
//!
//! The overlay also records the bitmap words and ticks a swap consults, which is the access
//! list a hosting ledger needs up front.

use crate::errors::ErrorCode;
use crate::events::PoolEvent;
use crate::oracle::Oracle;
use crate::position::{PersonalPosition, ProtocolPosition};
use crate::state::pool::Pool;
use crate::state::store::PoolStore;
use crate::tick::TickState;
use crate::tick_bitmap::{compress_tick, position, TickBitmapWord};
use anchor_lang::prelude::*;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Bitmap words and ticks consulted by an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    pub bitmap_words: BTreeSet<i16>,
    pub ticks: BTreeSet<i32>,
}

impl AccessList {
    /// Total number of distinct records.
    pub fn len(&self) -> usize {
        self.bitmap_words.len() + self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap_words.is_empty() && self.ticks.is_empty()
    }
}

/// Every write of a successful operation, ready to be applied to the store.
///
/// `None` entries delete the record under that key.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub pool: Pool,
    pub ticks: BTreeMap<i32, Option<TickState>>,
    pub bitmap_words: BTreeMap<i16, TickBitmapWord>,
    pub protocol_positions: BTreeMap<(i32, i32), Option<ProtocolPosition>>,
    pub personal_positions: BTreeMap<Pubkey, Option<PersonalPosition>>,
    pub oracle: Option<Oracle>,
    pub events: Vec<PoolEvent>,
    pub access_list: AccessList,
}

pub struct PoolTransaction<'a> {
    store: &'a PoolStore,
    /// Working copy of the pool record
    pub pool: Pool,
    ticks: BTreeMap<i32, Option<TickState>>,
    bitmap_words: BTreeMap<i16, TickBitmapWord>,
    protocol_positions: BTreeMap<(i32, i32), Option<ProtocolPosition>>,
    personal_positions: BTreeMap<Pubkey, Option<PersonalPosition>>,
    oracle: Cow<'a, Oracle>,
    events: Vec<PoolEvent>,
    access_list: AccessList,
}

impl<'a> PoolTransaction<'a> {
    pub fn new(store: &'a PoolStore) -> Self {
        Self {
            store,
            pool: store.pool.clone(),
            ticks: BTreeMap::new(),
            bitmap_words: BTreeMap::new(),
            protocol_positions: BTreeMap::new(),
            personal_positions: BTreeMap::new(),
            oracle: Cow::Borrowed(&store.oracle),
            events: Vec::new(),
            access_list: AccessList::default(),
        }
    }

    /// The tick record at `index`, if one exists.
    pub fn tick(&self, index: i32) -> Option<TickState> {
        match self.ticks.get(&index) {
            Some(staged) => *staged,
            None => self.store.ticks.get(&index).copied(),
        }
    }

    /// The tick record at `index`, or a fresh one when none exists yet.
    pub fn tick_or_new(&self, index: i32) -> TickState {
        self.tick(index).unwrap_or_else(|| TickState::new(index))
    }

    pub fn put_tick(&mut self, tick: TickState) {
        self.ticks.insert(tick.tick, Some(tick));
    }

    pub fn remove_tick(&mut self, index: i32) {
        self.ticks.insert(index, None);
    }

    /// The bitmap word at `word_pos`; all zero when it was never created.
    pub fn bitmap_word(&self, word_pos: i16) -> TickBitmapWord {
        match self.bitmap_words.get(&word_pos) {
            Some(word) => *word,
            None => self.store.tick_bitmap.word(word_pos),
        }
    }

    /// Toggles the bitmap bit of an aligned tick.
    pub fn flip_tick(&mut self, tick: i32) -> Result<()> {
        let tick_spacing = self.pool.tick_spacing;
        require!(
            tick % tick_spacing as i32 == 0,
            ErrorCode::TickNotAligned
        );
        let (word_pos, bit_pos) = position(compress_tick(tick, tick_spacing)?);
        let word = self.bitmap_word(word_pos).flipped(bit_pos);
        self.bitmap_words.insert(word_pos, word);
        Ok(())
    }

    pub fn is_tick_initialized(&self, tick: i32) -> Result<bool> {
        let (word_pos, bit_pos) = position(compress_tick(tick, self.pool.tick_spacing)?);
        Ok(self.bitmap_word(word_pos).is_set(bit_pos))
    }

    /// Checks that the bitmap bit of `tick` agrees with its gross liquidity.
    ///
    /// # Errors
    /// * `BitmapMismatch` if exactly one of them says the tick is initialized
    pub fn ensure_bitmap_consistent(&self, tick: i32) -> Result<()> {
        let referenced = self
            .tick(tick)
            .map(|t| t.is_initialized())
            .unwrap_or(false);
        require!(
            self.is_tick_initialized(tick)? == referenced,
            ErrorCode::BitmapMismatch
        );
        Ok(())
    }

    pub fn protocol_position(&self, tick_lower: i32, tick_upper: i32) -> Option<ProtocolPosition> {
        match self.protocol_positions.get(&(tick_lower, tick_upper)) {
            Some(staged) => *staged,
            None => self
                .store
                .protocol_positions
                .get(&(tick_lower, tick_upper))
                .copied(),
        }
    }

    pub fn put_protocol_position(&mut self, position: ProtocolPosition) {
        self.protocol_positions.insert(
            (position.tick_lower_index, position.tick_upper_index),
            Some(position),
        );
    }

    pub fn remove_protocol_position(&mut self, tick_lower: i32, tick_upper: i32) {
        self.protocol_positions
            .insert((tick_lower, tick_upper), None);
    }

    /// Stages a range record, or deletes it once it holds no liquidity and owes nothing.
    pub fn settle_protocol_position(&mut self, position: ProtocolPosition) {
        if position.is_empty() {
            self.remove_protocol_position(position.tick_lower_index, position.tick_upper_index);
        } else {
            self.put_protocol_position(position);
        }
    }

    /// Whether any live personal position covers exactly `[tick_lower, tick_upper)`.
    pub fn range_has_personal_positions(&self, tick_lower: i32, tick_upper: i32) -> bool {
        let covers = |position: &PersonalPosition| {
            position.tick_lower_index == tick_lower && position.tick_upper_index == tick_upper
        };
        self.personal_positions.values().flatten().any(covers)
            || self
                .store
                .personal_positions
                .iter()
                .filter(|(id, _)| !self.personal_positions.contains_key(*id))
                .any(|(_, position)| covers(position))
    }

    /// The personal position `position_id`.
    ///
    /// # Errors
    /// * `AccountNotFound` if no such position exists
    /// * `PositionPoolMismatch` if the record belongs to another pool
    pub fn personal_position(&self, position_id: &Pubkey) -> Result<PersonalPosition> {
        let position = match self.personal_positions.get(position_id) {
            Some(staged) => staged.clone(),
            None => self.store.personal_positions.get(position_id).cloned(),
        }
        .ok_or_else(|| error!(ErrorCode::AccountNotFound))?;
        require_keys_eq!(
            position.pool_id,
            self.pool.pool_id,
            ErrorCode::PositionPoolMismatch
        );
        Ok(position)
    }

    pub fn personal_position_exists(&self, position_id: &Pubkey) -> bool {
        match self.personal_positions.get(position_id) {
            Some(staged) => staged.is_some(),
            None => self.store.personal_positions.contains_key(position_id),
        }
    }

    pub fn put_personal_position(&mut self, position: PersonalPosition) {
        self.personal_positions
            .insert(position.position_id, Some(position));
    }

    pub fn remove_personal_position(&mut self, position_id: &Pubkey) {
        self.personal_positions.insert(*position_id, None);
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    /// Mutable oracle; the ring is copied on first use.
    pub fn oracle_mut(&mut self) -> &mut Oracle {
        self.oracle.to_mut()
    }

    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn touch_bitmap_word(&mut self, word_pos: i16) {
        self.access_list.bitmap_words.insert(word_pos);
    }

    pub fn touch_tick(&mut self, tick: i32) {
        self.access_list.ticks.insert(tick);
    }

    pub fn access_list(&self) -> &AccessList {
        &self.access_list
    }

    /// Fails once the access list outgrows a collaborator-imposed ceiling.
    ///
    /// # Errors
    /// * `TooManyTouchedAccounts` if more than `ceiling` records were touched
    pub fn ensure_access_within(&self, ceiling: Option<u16>) -> Result<()> {
        if let Some(ceiling) = ceiling {
            require!(
                self.access_list.len() <= ceiling as usize,
                ErrorCode::TooManyTouchedAccounts
            );
        }
        Ok(())
    }

    /// Ends the transaction, handing back every staged write.
    pub fn commit(self) -> Changeset {
        let oracle = match self.oracle {
            Cow::Owned(oracle) => Some(oracle),
            Cow::Borrowed(_) => None,
        };
        Changeset {
            pool: self.pool,
            ticks: self.ticks,
            bitmap_words: self.bitmap_words,
            protocol_positions: self.protocol_positions,
            personal_positions: self.personal_positions,
            oracle,
            events: self.events,
            access_list: self.access_list,
        }
    }
}
