//! Verification policy applied to candidate prices.
//!
//! Checks run in a fixed order and the first failure wins:
//! staleness, ETH conversion, absolute bounds, then delta against each
//! configured reference. The engine drives the order; this module holds
//! the individual checks so each can be tested in isolation.

use alloy::primitives::{Address, U256};
use oracle_chain::ReadError;

use crate::error::OracleError;
use crate::params::CommonParams;
use crate::u256_math::{deviation, exceeds_delta, mean, mul_div, wad_mul, WAD};

/// `source_timestamp` must be no older than `now - max_last_update`.
///
/// Timestamps ahead of `now` count as fresh.
pub fn check_staleness(
    token: Address,
    common: &CommonParams,
    source_timestamp: u64,
    now: u64,
) -> Result<(), OracleError> {
    if source_timestamp < now.saturating_sub(common.max_last_update) {
        return Err(OracleError::StalePrice {
            token,
            updated_at: source_timestamp,
            now,
            max_age: common.max_last_update,
        });
    }
    Ok(())
}

/// `min_price <= price <= max_price`.
pub fn check_bounds(token: Address, common: &CommonParams, price: U256) -> Result<(), OracleError> {
    if price < common.min_price || price > common.max_price {
        return Err(OracleError::PriceOutOfBounds {
            token,
            price,
            min: common.min_price,
            max: common.max_price,
        });
    }
    Ok(())
}

/// `|price - reference| * 100000 / reference <= delta_limit`.
pub fn check_delta(
    token: Address,
    common: &CommonParams,
    price: U256,
    reference: U256,
) -> Result<(), OracleError> {
    if exceeds_delta(price, reference, common.delta_limit) {
        return Err(OracleError::DeltaExceeded {
            token,
            price,
            reference,
            deviation: deviation(price, reference).unwrap_or(U256::MAX),
            limit: common.delta_limit,
        });
    }
    Ok(())
}

/// Convert an ETH-denominated price with ETH's verified price.
pub fn convert_eth(token: Address, price: U256, eth_price: U256) -> Result<U256, OracleError> {
    wad_mul(price, eth_price)
        .filter(|p| !p.is_zero())
        .ok_or_else(|| {
            OracleError::unavailable(
                token,
                ReadError::degenerate(token, "ETH conversion overflows or rounds to zero"),
            )
        })
}

/// Price the pool's quote side at the stables' mean verified price.
///
/// `None` when no stables are configured.
pub fn cross_stable_reference(price: U256, stable_prices: &[U256]) -> Option<U256> {
    let mean_price = mean(stable_prices)?;
    mul_div(price, mean_price, WAD)
}

/// Delta check against the cross-stable reference.
///
/// An empty stable list skips the check. A reference too large for U256
/// fails it.
pub fn check_cross_stable(
    token: Address,
    common: &CommonParams,
    price: U256,
    stable_prices: &[U256],
) -> Result<(), OracleError> {
    if stable_prices.is_empty() {
        return Ok(());
    }
    match cross_stable_reference(price, stable_prices) {
        Some(reference) => check_delta(token, common, price, reference),
        None => Err(OracleError::DeltaExceeded {
            token,
            price,
            reference: U256::MAX,
            deviation: U256::MAX,
            limit: common.delta_limit,
        }),
    }
}
