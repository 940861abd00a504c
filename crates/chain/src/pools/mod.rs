//! Pool adapters, one per topology.
//!
//! - [`CurveReader`]: two-coin (legacy and NG) and tricrypto EMA reads
//! - [`UniswapV2Reader`]: pair reserves
//! - [`UniswapV3Reader`]: tick cumulatives over a TWAP window

mod curve;
mod uniswap_v2;
mod uniswap_v3;

pub use curve::CurveReader;
pub use uniswap_v2::UniswapV2Reader;
pub use uniswap_v3::UniswapV3Reader;

use crate::contracts::IERC20Metadata;
use crate::reader::ReadError;
use alloy::primitives::Address;
use alloy::providers::Provider;
use dashmap::DashMap;
use std::sync::Arc;

/// ERC20 decimals lookup.
///
/// Decimals are immutable token metadata, so a memo is safe; pool state
/// itself is never cached.
pub struct TokenDecimals<P> {
    provider: Arc<P>,
    known: DashMap<Address, u8>,
}

impl<P: Provider + Clone + Send + Sync + 'static> TokenDecimals<P> {
    /// Create an empty lookup.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            known: DashMap::new(),
        }
    }

    /// Decimals for `token`.
    pub async fn get(&self, token: Address) -> Result<u8, ReadError> {
        if let Some(decimals) = self.known.get(&token) {
            return Ok(*decimals);
        }

        let contract = IERC20Metadata::new(token, &*self.provider);
        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| ReadError::unreachable(token, e))?
            ._0;

        self.known.insert(token, decimals);
        Ok(decimals)
    }

    /// Decimals for both sides of a pair.
    pub async fn pair(&self, token0: Address, token1: Address) -> Result<(u8, u8), ReadError> {
        futures::try_join!(self.get(token0), self.get(token1))
    }

    /// Number of tokens resolved so far.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
