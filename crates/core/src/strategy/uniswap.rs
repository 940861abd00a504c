//! Uniswap strategies.
//!
//! Both pool generations price token 1 in units of token 0 by default;
//! `is_reversed` prices token 0 in token 1 instead. Either side is computed
//! directly rather than by inverting the other, so no precision is lost to
//! a second division.

use oracle_chain::{FeedValue, ReadError, UniV2State, UniV3State};

use super::Candidate;
use crate::params::{UniV2Params, UniV3Params};
use crate::tick_math::{mean_tick, price_at_tick};
use crate::u256_math::ratio_wad;

/// Spot reserve ratio, decimal-adjusted.
pub fn uni_v2_price(
    params: &UniV2Params,
    state: &UniV2State,
    aggregator: Option<&FeedValue>,
) -> Result<Candidate, ReadError> {
    let price = if params.common.is_reversed {
        ratio_wad(state.reserve1, state.decimals1, state.reserve0, state.decimals0)
    } else {
        ratio_wad(state.reserve0, state.decimals0, state.reserve1, state.decimals1)
    }
    .filter(|p| !p.is_zero())
    .ok_or_else(|| ReadError::degenerate(params.pool_address, "reserve ratio rounds to zero"))?;

    Candidate::new(price, state.read_at).with_aggregator(aggregator, params.pool_address)
}

/// Price at the arithmetic mean tick over the TWAP window.
pub fn uni_v3_price(
    params: &UniV3Params,
    state: &UniV3State,
    aggregator: Option<&FeedValue>,
) -> Result<Candidate, ReadError> {
    let tick = mean_tick(
        state.tick_cumulative_start,
        state.tick_cumulative_end,
        state.window,
    )
    .ok_or_else(|| ReadError::degenerate(params.pool_address, "tick cumulatives out of range"))?;

    let price = price_at_tick(
        tick,
        state.decimals0,
        state.decimals1,
        !params.common.is_reversed,
    )
    .filter(|p| !p.is_zero())
    .ok_or_else(|| {
        ReadError::degenerate(params.pool_address, format!("no price at mean tick {tick}"))
    })?;

    Candidate::new(price, state.read_at).with_aggregator(aggregator, params.pool_address)
}
