/// Increase Observation Cardinality Instruction Module
///
/// Grows the oracle ring so it can answer queries further into the past. New slots only
/// enter rotation once the write index wraps onto them.
use crate::oracle::ObservationSlot;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Requests `observation_cardinality_next` slots, backed by `slots`.
///
/// # Returns
/// * The cardinality the oracle will grow to
///
/// # Errors
/// * `ObservationCardinalityOutOfRange` for a zero request
/// * `InvalidObservationSequence` if `slots` does not cover exactly the new indices in
///   ascending order for this pool
pub fn handler(
    tx: &mut PoolTransaction,
    observation_cardinality_next: u16,
    slots: &[ObservationSlot],
) -> Result<u16> {
    let pool_id = tx.pool.pool_id;
    let next = tx.oracle_mut().grow(observation_cardinality_next, slots)?;
    msg!("Pool {} observation cardinality next {}", pool_id, next);
    Ok(next)
}

impl PoolStore {
    /// See [`handler`].
    pub fn increase_observation_cardinality(
        &mut self,
        observation_cardinality_next: u16,
        slots: &[ObservationSlot],
    ) -> Result<u16> {
        self.transact(|tx| handler(tx, observation_cardinality_next, slots))
    }
}
