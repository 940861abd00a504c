//! Feed value types.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Latest value reported by a price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedValue {
    /// Answer (in feed decimals)
    pub answer: U256,
    /// Feed decimals
    pub decimals: u8,
    /// Timestamp when the answer was computed
    pub updated_at: u64,
}

impl FeedValue {
    /// Create a new feed value.
    pub fn new(answer: U256, decimals: u8, updated_at: u64) -> Self {
        Self {
            answer,
            decimals,
            updated_at,
        }
    }

    /// Answer normalised to 18 decimals, `None` if it overflows.
    pub fn normalize_to_18(&self) -> Option<U256> {
        let ten = U256::from(10u8);
        if self.decimals <= 18 {
            let scale = ten.checked_pow(U256::from(18 - self.decimals))?;
            self.answer.checked_mul(scale)
        } else {
            let scale = ten.checked_pow(U256::from(self.decimals - 18))?;
            Some(self.answer / scale)
        }
    }
}
