//! Curve EMA strategies.
//!
//! Curve pools expose an exponential moving average of the non-base coin
//! quoted in coin 0. The virtual price is read alongside as a health check
//! (the chain adapter rejects a zero value) but does not enter the price.

use oracle_chain::{CurvePoolState, ReadError};

use super::{orient, Candidate};
use crate::params::{CurveDuoParams, CurveTriParams};

/// Two-coin pool: coin 1 in coin 0, or coin 0 in coin 1 when reversed.
pub fn curve_duo_price(
    params: &CurveDuoParams,
    state: &CurvePoolState,
) -> Result<Candidate, ReadError> {
    let price = orient(
        state.price_oracle,
        params.common.is_reversed,
        params.pool_address,
    )?;
    Ok(Candidate::new(price, state.last_update))
}

/// Tricrypto pool: coin `k + 1` in coin 0, or the inverse when reversed.
pub fn curve_tri_price(
    params: &CurveTriParams,
    state: &CurvePoolState,
) -> Result<Candidate, ReadError> {
    let price = orient(
        state.price_oracle,
        params.common.is_reversed,
        params.pool_address,
    )?;
    Ok(Candidate::new(price, state.last_update))
}
