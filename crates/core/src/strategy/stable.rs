//! Aggregator-fed strategy.

use oracle_chain::{FeedValue, ReadError};

use super::{normalized, orient, Candidate};
use crate::params::StableParams;

/// Feed answer normalised to 18 decimals.
pub fn stable_price(params: &StableParams, feed: &FeedValue) -> Result<Candidate, ReadError> {
    let price = orient(
        normalized(feed, params.aggregator_oracle)?,
        params.common.is_reversed,
        params.aggregator_oracle,
    )?;
    Ok(Candidate::new(price, feed.updated_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CommonParams;
    use crate::u256_math::WAD;
    use alloy::primitives::{Address, U256};

    fn params(reversed: bool) -> StableParams {
        let mut common = CommonParams::bounded(U256::ZERO, U256::MAX, 3600);
        common.is_reversed = reversed;
        StableParams {
            common,
            aggregator_oracle: Address::repeat_byte(0x01),
        }
    }

    #[test]
    fn test_stable_price() {
        let feed = FeedValue::new(U256::from(100_100_000u64), 8, 1_700_000_000);
        let candidate = stable_price(&params(false), &feed).unwrap();
        assert_eq!(candidate.price, U256::from(1_001_000_000_000_000_000u64));
        assert_eq!(candidate.source_timestamp, 1_700_000_000);
        assert_eq!(candidate.aggregator_reference, None);
    }

    #[test]
    fn test_stable_price_reversed() {
        let feed = FeedValue::new(U256::from(400_000_000u64), 8, 1_700_000_000);
        let candidate = stable_price(&params(true), &feed).unwrap();
        assert_eq!(candidate.price, WAD / U256::from(4u8));
    }

    #[test]
    fn test_stable_price_zero_answer() {
        let feed = FeedValue::new(U256::ZERO, 8, 1_700_000_000);
        assert!(matches!(
            stable_price(&params(false), &feed),
            Err(ReadError::Degenerate { .. })
        ));
    }
}
