/// Multi-hop Route Module
///
/// Chains single-pool swaps along a token path: the output of each hop is the input of the
/// next. Every hop runs on its own staged transaction and the changesets are applied only
/// once all hops succeeded, so a failing hop leaves every pool untouched.
use crate::constants::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use crate::errors::ErrorCode;
use crate::instructions::check_deadline;
use crate::instructions::swap::{self, SwapParams, SwapResult};
use crate::staging::{Changeset, PoolTransaction};
use crate::state::pool::PoolKey;
use crate::state::store::PoolRegistry;
use anchor_lang::prelude::*;
use std::collections::BTreeSet;

/// A route through one or more pools.
///
/// `tokens[i]` is swapped for `tokens[i + 1]` in the pool with fee `fees[i]`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct SwapPath {
    pub tokens: Vec<Pubkey>,
    pub fees: Vec<u32>,
}

/// One step of a validated path.
#[derive(Clone, Copy, Debug)]
struct Hop {
    key: PoolKey,
    zero_for_one: bool,
}

impl SwapPath {
    pub fn new(tokens: Vec<Pubkey>, fees: Vec<u32>) -> Self {
        Self { tokens, fees }
    }

    /// Resolves the pools of the path, in path order.
    ///
    /// # Errors
    /// * `InvalidRoute` if the path is empty, its lengths disagree, a hop swaps a token for
    ///   itself or the same pool appears twice
    fn hops(&self) -> Result<Vec<Hop>> {
        require!(
            !self.fees.is_empty() && self.tokens.len() == self.fees.len() + 1,
            ErrorCode::InvalidRoute
        );
        let mut seen = BTreeSet::new();
        let mut hops = Vec::with_capacity(self.fees.len());
        for (pair, fee) in self.tokens.windows(2).zip(&self.fees) {
            let (token_in, token_out) = (pair[0], pair[1]);
            require!(token_in != token_out, ErrorCode::InvalidRoute);
            let key = PoolKey::new(token_in, token_out, *fee);
            // A pool can only be staged once per route
            require!(seen.insert(key), ErrorCode::InvalidRoute);
            hops.push(Hop {
                key,
                zero_for_one: token_in < token_out,
            });
        }
        Ok(hops)
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExactInputParams {
    pub path: SwapPath,
    pub amount_in: u64,
    pub amount_out_minimum: u64,
    pub deadline: Option<u64>,
    pub now: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExactOutputParams {
    pub path: SwapPath,
    pub amount_out: u64,
    pub amount_in_maximum: u64,
    pub deadline: Option<u64>,
    pub now: u64,
}

/// What a route moved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteResult {
    /// Paid into the first pool
    pub amount_in: u64,
    /// Paid out of the last pool
    pub amount_out: u64,
    /// Per-hop results, in path order
    pub hops: Vec<SwapResult>,
}

fn unbounded_limit(zero_for_one: bool) -> u128 {
    if zero_for_one {
        MIN_SQRT_PRICE_X64 + 1
    } else {
        MAX_SQRT_PRICE_X64 - 1
    }
}

fn to_i64(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| error!(ErrorCode::MathOverflow))
}

fn stage_hop(
    registry: &PoolRegistry,
    hop: &Hop,
    amount_specified: i64,
    now: u64,
) -> Result<(SwapResult, Changeset)> {
    let store = registry.pool(&hop.key)?;
    let mut tx = PoolTransaction::new(store);
    let result = swap::handler(
        &mut tx,
        &registry.config,
        &SwapParams {
            zero_for_one: hop.zero_for_one,
            amount_specified,
            sqrt_price_limit_x64: unbounded_limit(hop.zero_for_one),
            // Hops are unbounded; the route checks its own minimum or maximum
            other_amount_threshold: if amount_specified < 0 { u64::MAX } else { 0 },
            deadline: None,
            now,
        },
    )?;
    Ok((result, tx.commit()))
}

/// Swaps an exact amount of `path.tokens[0]` for as much of the last token as possible.
///
/// # Errors
/// * `InvalidRoute` for a malformed path
/// * `AccountNotFound` if a hop's pool does not exist
/// * `SlippageExceeded` if the final output is below `amount_out_minimum`
/// * any error of the single-pool swap
pub fn exact_input(registry: &mut PoolRegistry, params: &ExactInputParams) -> Result<RouteResult> {
    check_deadline(params.deadline, params.now)?;
    require!(params.amount_in > 0, ErrorCode::ZeroAmount);
    let hops = params.path.hops()?;

    let mut amount = params.amount_in;
    let mut results = Vec::with_capacity(hops.len());
    let mut changesets = Vec::with_capacity(hops.len());
    for hop in &hops {
        let (result, changeset) = stage_hop(registry, hop, to_i64(amount)?, params.now)?;
        amount = result.amount_out(hop.zero_for_one);
        results.push(result);
        changesets.push((hop.key, changeset));
    }
    require!(
        amount >= params.amount_out_minimum,
        ErrorCode::SlippageExceeded
    );

    let amount_in = results
        .first()
        .zip(hops.first())
        .map(|(result, hop)| result.amount_in(hop.zero_for_one))
        .unwrap_or_default();
    registry.apply_all(changesets)?;
    msg!(
        "Route of {} hops: {} in, {} out",
        hops.len(),
        amount_in,
        amount
    );
    Ok(RouteResult {
        amount_in,
        amount_out: amount,
        hops: results,
    })
}

/// Swaps as little of `path.tokens[0]` as possible for an exact amount of the last token.
///
/// Hops are priced from the last pool backwards; every hop must deliver the full amount the
/// following hop needs.
///
/// # Errors
/// * `InvalidRoute` for a malformed path
/// * `AccountNotFound` if a hop's pool does not exist
/// * `SlippageExceeded` if a hop cannot deliver in full or the input exceeds
///   `amount_in_maximum`
/// * any error of the single-pool swap
pub fn exact_output(
    registry: &mut PoolRegistry,
    params: &ExactOutputParams,
) -> Result<RouteResult> {
    check_deadline(params.deadline, params.now)?;
    require!(params.amount_out > 0, ErrorCode::ZeroAmount);
    let hops = params.path.hops()?;

    let mut amount = params.amount_out;
    let mut results = Vec::with_capacity(hops.len());
    let mut changesets = Vec::with_capacity(hops.len());
    for hop in hops.iter().rev() {
        let wanted = to_i64(amount)?
            .checked_neg()
            .ok_or_else(|| error!(ErrorCode::MathOverflow))?;
        let (result, changeset) = stage_hop(registry, hop, wanted, params.now)?;
        require!(
            result.amount_out(hop.zero_for_one) == amount,
            ErrorCode::SlippageExceeded
        );
        amount = result.amount_in(hop.zero_for_one);
        results.push(result);
        changesets.push((hop.key, changeset));
    }
    require!(
        amount <= params.amount_in_maximum,
        ErrorCode::SlippageExceeded
    );

    results.reverse();
    registry.apply_all(changesets)?;
    msg!(
        "Route of {} hops: {} in, {} out",
        hops.len(),
        amount,
        params.amount_out
    );
    Ok(RouteResult {
        amount_in: amount,
        amount_out: params.amount_out,
        hops: results,
    })
}

impl PoolRegistry {
    /// See [`exact_input`].
    pub fn swap_exact_input(&mut self, params: &ExactInputParams) -> Result<RouteResult> {
        exact_input(self, params)
    }

    /// See [`exact_output`].
    pub fn swap_exact_output(&mut self, params: &ExactOutputParams) -> Result<RouteResult> {
        exact_output(self, params)
    }
}
