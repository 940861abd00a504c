//! Provider management and the composed on-chain reader.
//! Uses Alloy providers for type-safe RPC interactions.

use crate::oracle::{ChainlinkFeedReader, FeedValue};
use crate::pools::{CurveReader, TokenDecimals, UniswapV2Reader, UniswapV3Reader};
use crate::reader::{CurvePoolState, FeedReader, PoolReader, ReadError, UniV2State, UniV3State};
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Provider manager for the RPC connection.
#[derive(Debug, Clone)]
pub struct ProviderManager {
    /// HTTP RPC URL used for all reads
    rpc_url: String,
}

impl ProviderManager {
    /// Create a new provider manager and verify the endpoint responds.
    pub async fn new(rpc_url: &str) -> Result<Self> {
        info!(rpc = rpc_url, "Initializing provider manager");

        let provider = ProviderBuilder::new().on_http(rpc_url.parse()?);
        let block = provider.get_block_number().await?;
        info!(block = block, "Provider connection verified");

        Ok(Self {
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Get the RPC URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get current block number.
    pub async fn block_number(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let block = provider.get_block_number().await?;
        Ok(block)
    }

    /// Get chain ID.
    pub async fn chain_id(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let chain_id = provider.get_chain_id().await?;
        Ok(chain_id)
    }

    /// Build a reader bound to this endpoint.
    pub fn reader(&self) -> Result<OnChainReader<impl Provider + Clone + Send + Sync + 'static>> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        Ok(OnChainReader::new(Arc::new(provider)))
    }

    /// Check if provider is healthy.
    pub async fn health_check(&self) -> Result<bool> {
        let block = self.block_number().await?;
        debug!(block = block, "Provider health check passed");
        Ok(block > 0)
    }
}

/// Every adapter behind one provider.
pub struct OnChainReader<P> {
    feeds: ChainlinkFeedReader<P>,
    curve: CurveReader<P>,
    uniswap_v2: UniswapV2Reader<P>,
    uniswap_v3: UniswapV3Reader<P>,
}

impl<P> std::fmt::Debug for OnChainReader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnChainReader")
            .field("feeds", &self.feeds)
            .finish()
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> OnChainReader<P> {
    /// Create adapters sharing `provider`.
    pub fn new(provider: Arc<P>) -> Self {
        let decimals = Arc::new(TokenDecimals::new(Arc::clone(&provider)));

        Self {
            feeds: ChainlinkFeedReader::new(Arc::clone(&provider)),
            curve: CurveReader::new(Arc::clone(&provider)),
            uniswap_v2: UniswapV2Reader::new(Arc::clone(&provider), Arc::clone(&decimals)),
            uniswap_v3: UniswapV3Reader::new(provider, decimals),
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> FeedReader for OnChainReader<P> {
    async fn latest_feed(&self, feed: Address) -> Result<FeedValue, ReadError> {
        self.feeds.read(feed).await
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> PoolReader for OnChainReader<P> {
    async fn curve_duo(&self, pool: Address, is_ng: bool) -> Result<CurvePoolState, ReadError> {
        self.curve.read_duo(pool, is_ng).await
    }

    async fn curve_tri(&self, pool: Address, k: u8) -> Result<CurvePoolState, ReadError> {
        self.curve.read_tri(pool, k).await
    }

    async fn uni_v2(&self, pool: Address) -> Result<UniV2State, ReadError> {
        self.uniswap_v2.read(pool).await
    }

    async fn uni_v3_twap(&self, pool: Address, window: u32) -> Result<UniV3State, ReadError> {
        self.uniswap_v3.read_twap(pool, window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_provider_creation() {
        let manager = ProviderManager::new("https://eth.llamarpc.com").await;
        assert!(manager.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_mainnet_eth_usd_feed() {
        let manager = ProviderManager::new("https://eth.llamarpc.com").await.unwrap();
        let reader = manager.reader().unwrap();

        // Chainlink ETH/USD on mainnet
        let feed: Address = "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419".parse().unwrap();
        let value = reader.latest_feed(feed).await.unwrap();
        assert_eq!(value.decimals, 8);
        assert!(!value.answer.is_zero());
    }
}
