//! Pricing strategies.
//!
//! Each strategy is a pure function from raw source state plus params to a
//! [`Candidate`]. Nothing here performs I/O or verification; the engine
//! reads the state, calls the strategy and hands the candidate to the
//! verification policy.

mod curve;
mod stable;
mod uniswap;

pub use curve::{curve_duo_price, curve_tri_price};
pub use stable::stable_price;
pub use uniswap::{uni_v2_price, uni_v3_price};

use alloy::primitives::{Address, U256};
use oracle_chain::{FeedValue, ReadError};

use crate::u256_math::wad_inverse;

/// Unverified price produced by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// WAD price, in ETH when the token is ETH-related
    pub price: U256,
    /// Oldest timestamp among the inputs
    pub source_timestamp: u64,
    /// Aggregator price to check the delta against (WAD)
    pub aggregator_reference: Option<U256>,
}

impl Candidate {
    pub fn new(price: U256, source_timestamp: u64) -> Self {
        Self {
            price,
            source_timestamp,
            aggregator_reference: None,
        }
    }

    /// Fold an aggregator feed in as the delta reference.
    pub(crate) fn with_aggregator(
        mut self,
        feed: Option<&FeedValue>,
        source: Address,
    ) -> Result<Self, ReadError> {
        if let Some(feed) = feed {
            self.aggregator_reference = Some(normalized(feed, source)?);
            self.source_timestamp = self.source_timestamp.min(feed.updated_at);
        }
        Ok(self)
    }
}

/// Feed answer as WAD.
pub(crate) fn normalized(feed: &FeedValue, source: Address) -> Result<U256, ReadError> {
    feed.normalize_to_18()
        .ok_or_else(|| ReadError::degenerate(source, "feed answer overflows 18 decimals"))
}

/// Invert a quote when the params select the other side of the pool.
pub(crate) fn orient(price: U256, reversed: bool, source: Address) -> Result<U256, ReadError> {
    let oriented = if reversed { wad_inverse(price) } else { Some(price) };
    match oriented {
        Some(p) if !p.is_zero() => Ok(p),
        _ => Err(ReadError::degenerate(source, "price rounds to zero or overflows")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::u256_math::WAD;

    #[test]
    fn test_orient() {
        let source = Address::repeat_byte(0x01);
        let two = WAD * U256::from(2u8);
        assert_eq!(orient(two, false, source), Ok(two));
        assert_eq!(orient(two, true, source), Ok(WAD / U256::from(2u8)));
        // 1e36 / (1e36 + 1) rounds to zero
        assert!(orient(WAD * WAD + U256::from(1u8), true, source).is_err());
        assert!(orient(U256::ZERO, true, source).is_err());
    }

    #[test]
    fn test_with_aggregator_takes_oldest_timestamp() {
        let feed = FeedValue::new(U256::from(100_000_000u64), 8, 900);
        let source = Address::repeat_byte(0x02);
        let candidate = Candidate::new(WAD, 1_000)
            .with_aggregator(Some(&feed), source)
            .unwrap();
        assert_eq!(candidate.aggregator_reference, Some(WAD));
        assert_eq!(candidate.source_timestamp, 900);

        let untouched = Candidate::new(WAD, 1_000).with_aggregator(None, source);
        assert_eq!(untouched, Ok(Candidate::new(WAD, 1_000)));
    }

    #[test]
    fn test_with_aggregator_rejects_overflowing_feed() {
        let feed = FeedValue::new(U256::MAX, 8, 900);
        let source = Address::repeat_byte(0x02);
        assert!(matches!(
            Candidate::new(WAD, 1_000).with_aggregator(Some(&feed), source),
            Err(ReadError::Degenerate { .. })
        ));
    }
}
