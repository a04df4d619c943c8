/// Close Position Instruction Module
///
/// Deletes a personal position that holds nothing any more. The range's protocol position
/// goes with it once no other personal position keeps it alive, along with any rounding
/// dust it still owes.
use crate::errors::ErrorCode;
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// # Errors
/// * `UnauthorizedAccess` unless `caller` is the owner or delegate
/// * `PositionNotCleared` while liquidity, fees or rewards remain
pub fn handler(tx: &mut PoolTransaction, caller: &Pubkey, position_id: &Pubkey) -> Result<()> {
    let position = tx.personal_position(position_id)?;
    position.ensure_authorized(caller)?;
    require!(position.is_cleared(), ErrorCode::PositionNotCleared);

    let (tick_lower, tick_upper) = (position.tick_lower_index, position.tick_upper_index);
    tx.remove_personal_position(position_id);
    if let Some(protocol_position) = tx.protocol_position(tick_lower, tick_upper) {
        // Owed dust of a range nobody holds any more is rounding residue, not a claim
        if protocol_position.liquidity == 0
            && !tx.range_has_personal_positions(tick_lower, tick_upper)
        {
            tx.remove_protocol_position(tick_lower, tick_upper);
            msg!(
                "Range [{}, {}) released with dust {} / {}",
                tick_lower,
                tick_upper,
                protocol_position.tokens_owed_0,
                protocol_position.tokens_owed_1
            );
        }
    }

    msg!("Position {} closed", position_id);
    Ok(())
}

impl PoolStore {
    /// See [`handler`].
    pub fn close_position(&mut self, caller: &Pubkey, position_id: &Pubkey) -> Result<()> {
        self.transact(|tx| handler(tx, caller, position_id))
    }
}
