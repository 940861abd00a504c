//! External price feed adapters.
//!
//! Feeds are Chainlink-compatible aggregators. A feed read yields the raw
//! answer, its decimals and the update timestamp; staleness and bound checks
//! are applied later by the verification policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use oracle_chain::oracle::ChainlinkFeedReader;
//!
//! let reader = ChainlinkFeedReader::new(provider);
//! let value = reader.read(aggregator).await?;
//! let price_wad = value.normalize_to_18();  // None on overflow
//! ```

mod chainlink;
mod types;

pub use chainlink::ChainlinkFeedReader;
pub use types::FeedValue;

use alloy::primitives::U256;

/// Round data from an aggregator.
#[derive(Debug, Clone)]
pub struct RoundData {
    /// Round ID
    pub round_id: u128,
    /// Price answer (negative answers are clamped to zero)
    pub answer: U256,
    /// Timestamp when round started
    pub started_at: u64,
    /// Timestamp when answer was computed
    pub updated_at: u64,
    /// Round ID for which answer was computed
    pub answered_in_round: u128,
}

impl RoundData {
    /// Check if this round's data is usable.
    pub fn is_valid(&self) -> bool {
        !self.answer.is_zero() && self.updated_at > 0 && self.answered_in_round >= self.round_id
    }

    /// Convert into a feed value with the aggregator's decimals.
    pub fn into_feed_value(self, decimals: u8) -> FeedValue {
        FeedValue::new(self.answer, decimals, self.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_data_validity() {
        let valid_round = RoundData {
            round_id: 100,
            answer: U256::from(200_000_000_000u64), // $2000
            started_at: 1700000000,
            updated_at: 1700000100,
            answered_in_round: 100,
        };
        assert!(valid_round.is_valid());

        let invalid_round = RoundData {
            round_id: 100,
            answer: U256::ZERO,
            started_at: 1700000000,
            updated_at: 0,
            answered_in_round: 99,
        };
        assert!(!invalid_round.is_valid());
    }

    #[test]
    fn test_round_into_feed_value() {
        let round = RoundData {
            round_id: 7,
            answer: U256::from(100_100_000u64),
            started_at: 1700000000,
            updated_at: 1700000050,
            answered_in_round: 7,
        };

        let value = round.into_feed_value(8);
        assert_eq!(value.updated_at, 1700000050);
        assert_eq!(
            value.normalize_to_18(),
            Some(U256::from(1_001_000_000_000_000_000u128))
        );
    }
}
