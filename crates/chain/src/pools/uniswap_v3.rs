//! Uniswap V3 pool adapter.

use super::TokenDecimals;
use crate::contracts::IUniswapV3Pool;
use crate::reader::{unix_now, ReadError, UniV3State};
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::debug;

/// Reads tick cumulatives for TWAP computation.
pub struct UniswapV3Reader<P> {
    provider: Arc<P>,
    decimals: Arc<TokenDecimals<P>>,
}

impl<P> std::fmt::Debug for UniswapV3Reader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniswapV3Reader").finish()
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> UniswapV3Reader<P> {
    /// Create a new reader sharing a decimals lookup.
    pub fn new(provider: Arc<P>, decimals: Arc<TokenDecimals<P>>) -> Self {
        Self { provider, decimals }
    }

    /// Tick cumulatives at `now - window` and `now`.
    ///
    /// The pool reverts when its observation buffer doesn't reach back
    /// `window` seconds; that surfaces as an unreachable source.
    pub async fn read_twap(&self, pool: Address, window: u32) -> Result<UniV3State, ReadError> {
        if window == 0 {
            return Err(ReadError::degenerate(pool, "zero TWAP window"));
        }

        let contract = IUniswapV3Pool::new(pool, &*self.provider);

        let observe_call = contract.observe(vec![window, 0]);
        let token0_call = contract.token0();
        let token1_call = contract.token1();

        let (observed, token0, token1) = futures::try_join!(
            observe_call.call().into_future(),
            token0_call.call().into_future(),
            token1_call.call().into_future()
        )
        .map_err(|e| ReadError::unreachable(pool, e))?;

        let cumulatives = observed.tickCumulatives;
        if cumulatives.len() != 2 {
            return Err(ReadError::degenerate(
                pool,
                format!("expected 2 observations, got {}", cumulatives.len()),
            ));
        }

        let tick_cumulative_start = cumulative_to_i64(pool, cumulatives[0])?;
        let tick_cumulative_end = cumulative_to_i64(pool, cumulatives[1])?;

        let (decimals0, decimals1) = self.decimals.pair(token0._0, token1._0).await?;

        debug!(
            pool = %pool,
            window = window,
            start = tick_cumulative_start,
            end = tick_cumulative_end,
            "Read Uniswap V3 observations"
        );

        Ok(UniV3State {
            tick_cumulative_start,
            tick_cumulative_end,
            window,
            decimals0,
            decimals1,
            read_at: unix_now(),
        })
    }
}

/// `int56` tick cumulatives always fit an `i64`.
fn cumulative_to_i64<T>(pool: Address, value: T) -> Result<i64, ReadError>
where
    i64: TryFrom<T>,
{
    i64::try_from(value).map_err(|_| ReadError::degenerate(pool, "tick cumulative out of range"))
}
