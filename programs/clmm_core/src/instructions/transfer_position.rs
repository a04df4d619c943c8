/// Ownership changes of a personal position.
use crate::staging::PoolTransaction;
use crate::state::store::PoolStore;
use anchor_lang::prelude::*;

/// Grants (`Some`) or revokes (`None`) a delegate. Owner only.
pub fn approve(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    delegate: Option<Pubkey>,
) -> Result<()> {
    let mut position = tx.personal_position(position_id)?;
    position.approve(caller, delegate)?;
    msg!("Position {} delegate set to {:?}", position_id, delegate);
    tx.put_personal_position(position);
    Ok(())
}

/// Hands a position to `new_owner`, clearing any delegate. Owner only.
pub fn handler(
    tx: &mut PoolTransaction,
    caller: &Pubkey,
    position_id: &Pubkey,
    new_owner: Pubkey,
) -> Result<()> {
    let mut position = tx.personal_position(position_id)?;
    position.transfer(caller, new_owner)?;
    msg!("Position {} transferred to {}", position_id, new_owner);
    tx.put_personal_position(position);
    Ok(())
}

impl PoolStore {
    pub fn approve_position(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        delegate: Option<Pubkey>,
    ) -> Result<()> {
        self.transact(|tx| approve(tx, caller, position_id, delegate))
    }

    pub fn transfer_position(
        &mut self,
        caller: &Pubkey,
        position_id: &Pubkey,
        new_owner: Pubkey,
    ) -> Result<()> {
        self.transact(|tx| handler(tx, caller, position_id, new_owner))
    }
}
