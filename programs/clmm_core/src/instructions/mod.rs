pub mod close_position;
pub mod collect;
pub mod collect_protocol_fees;
pub mod decrease_liquidity;
pub mod increase_liquidity;
pub mod increase_observation_cardinality;
pub mod initialize_pool;
pub mod initialize_reward;
pub mod modify_position;
pub mod route;
pub mod set_reward_params;
pub mod swap;
pub mod transfer_position;

use crate::errors::ErrorCode;
use anchor_lang::prelude::*;

/// Rejects a request whose deadline has passed.
///
/// # Errors
/// * `DeadlineExceeded` if `now` is later than `deadline`
pub fn check_deadline(deadline: Option<u64>, now: u64) -> Result<()> {
    if let Some(deadline) = deadline {
        require!(now <= deadline, ErrorCode::DeadlineExceeded);
    }
    Ok(())
}
