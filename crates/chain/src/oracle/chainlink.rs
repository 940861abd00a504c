//! Chainlink aggregator adapter.

use super::{FeedValue, RoundData};
use crate::contracts::IAggregatorV3;
use crate::reader::ReadError;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Reads `latestRoundData` from Chainlink-compatible aggregators.
///
/// Aggregator decimals never change, so they are memoised per feed.
/// Round data is always read live.
pub struct ChainlinkFeedReader<P> {
    /// Provider for RPC calls
    provider: Arc<P>,
    /// Decimals by aggregator address
    decimals: DashMap<Address, u8>,
}

impl<P> std::fmt::Debug for ChainlinkFeedReader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainlinkFeedReader")
            .field("known_feeds", &self.decimals.len())
            .finish()
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> ChainlinkFeedReader<P> {
    /// Create a new feed reader.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            decimals: DashMap::new(),
        }
    }

    /// Fetch (or recall) aggregator decimals.
    pub async fn feed_decimals(&self, feed: Address) -> Result<u8, ReadError> {
        if let Some(decimals) = self.decimals.get(&feed) {
            return Ok(*decimals);
        }

        let contract = IAggregatorV3::new(feed, &*self.provider);
        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| ReadError::unreachable(feed, e))?
            ._0;

        self.decimals.insert(feed, decimals);
        Ok(decimals)
    }

    /// Latest round from the aggregator.
    pub async fn latest_round(&self, feed: Address) -> Result<RoundData, ReadError> {
        let contract = IAggregatorV3::new(feed, &*self.provider);
        let round = contract
            .latestRoundData()
            .call()
            .await
            .map_err(|e| ReadError::unreachable(feed, e))?;

        // Price should always be positive
        let answer = if round.answer.is_negative() {
            U256::ZERO
        } else {
            // I256 is two's complement, so positive values have same bit representation
            U256::from_limbs(round.answer.into_raw().into_limbs())
        };

        Ok(RoundData {
            round_id: round.roundId.to::<u128>(),
            answer,
            started_at: round.startedAt.saturating_to::<u64>(),
            updated_at: round.updatedAt.saturating_to::<u64>(),
            answered_in_round: round.answeredInRound.to::<u128>(),
        })
    }

    /// Latest usable feed value.
    pub async fn read(&self, feed: Address) -> Result<FeedValue, ReadError> {
        let decimals = self.feed_decimals(feed).await?;
        let round = self.latest_round(feed).await?;

        if !round.is_valid() {
            return Err(ReadError::degenerate(
                feed,
                format!(
                    "invalid round {} (answer {}, updated_at {})",
                    round.round_id, round.answer, round.updated_at
                ),
            ));
        }

        debug!(
            feed = %feed,
            answer = %round.answer,
            decimals = decimals,
            updated_at = round.updated_at,
            "Read feed"
        );

        let value = round.into_feed_value(decimals);
        if value.normalize_to_18().is_none() {
            return Err(ReadError::degenerate(feed, "answer overflows 18 decimals"));
        }
        Ok(value)
    }
}
