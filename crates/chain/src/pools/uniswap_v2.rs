//! Uniswap V2 pair adapter.

use super::TokenDecimals;
use crate::contracts::IUniswapV2Pair;
use crate::reader::{unix_now, ReadError, UniV2State};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::debug;

/// Reads pair reserves and token decimals.
pub struct UniswapV2Reader<P> {
    provider: Arc<P>,
    decimals: Arc<TokenDecimals<P>>,
}

impl<P> std::fmt::Debug for UniswapV2Reader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniswapV2Reader").finish()
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> UniswapV2Reader<P> {
    /// Create a new reader sharing a decimals lookup.
    pub fn new(provider: Arc<P>, decimals: Arc<TokenDecimals<P>>) -> Self {
        Self { provider, decimals }
    }

    /// Current reserves of `pool`.
    pub async fn read(&self, pool: Address) -> Result<UniV2State, ReadError> {
        let contract = IUniswapV2Pair::new(pool, &*self.provider);

        let reserves_call = contract.getReserves();
        let token0_call = contract.token0();
        let token1_call = contract.token1();

        let (reserves, token0, token1) = futures::try_join!(
            reserves_call.call().into_future(),
            token0_call.call().into_future(),
            token1_call.call().into_future()
        )
        .map_err(|e| ReadError::unreachable(pool, e))?;

        let (decimals0, decimals1) = self.decimals.pair(token0._0, token1._0).await?;

        let state = UniV2State {
            reserve0: U256::from(reserves.reserve0.to::<u128>()),
            reserve1: U256::from(reserves.reserve1.to::<u128>()),
            decimals0,
            decimals1,
            read_at: unix_now(),
        };

        if state.reserve0.is_zero() || state.reserve1.is_zero() {
            return Err(ReadError::degenerate(pool, "zero reserves"));
        }

        debug!(
            pool = %pool,
            reserve0 = %state.reserve0,
            reserve1 = %state.reserve1,
            "Read Uniswap V2 reserves"
        );

        Ok(state)
    }
}
