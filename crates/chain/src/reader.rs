//! Read-only source abstractions.
//!
//! Every adapter returns raw numeric state as of the call. Nothing here
//! interprets prices; that is the job of the strategies in `oracle-core`.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::oracle::FeedValue;

/// Failure to obtain usable state from a pool or feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The RPC call failed or the contract reverted.
    #[error("source {address} unreachable: {reason}")]
    Unreachable { address: Address, reason: String },

    /// The call succeeded but the state cannot be priced (empty pool, zero answer).
    #[error("source {address} returned degenerate state: {reason}")]
    Degenerate { address: Address, reason: String },
}

impl ReadError {
    /// Wrap a transport/contract error.
    pub fn unreachable(address: Address, err: impl Display) -> Self {
        Self::Unreachable {
            address,
            reason: err.to_string(),
        }
    }

    /// Flag degenerate state.
    pub fn degenerate(address: Address, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            address,
            reason: reason.into(),
        }
    }

    /// Address of the source that failed.
    pub fn address(&self) -> Address {
        match self {
            Self::Unreachable { address, .. } | Self::Degenerate { address, .. } => *address,
        }
    }
}

/// Curve pool EMA read (two-coin or tricrypto).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurvePoolState {
    /// EMA price of the selected coin quoted in coin 0 (18 decimals)
    pub price_oracle: U256,
    /// LP virtual price (18 decimals)
    pub virtual_price: U256,
    /// Timestamp of the last price EMA update
    pub last_update: u64,
}

/// Uniswap V2 pair reserves with token decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniV2State {
    pub reserve0: U256,
    pub reserve1: U256,
    pub decimals0: u8,
    pub decimals1: u8,
    /// Wall-clock time of the read
    pub read_at: u64,
}

/// Uniswap V3 tick accumulator observations spanning a TWAP window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniV3State {
    /// `tickCumulative` at `now - window`
    pub tick_cumulative_start: i64,
    /// `tickCumulative` at `now`
    pub tick_cumulative_end: i64,
    /// Observation window in seconds
    pub window: u32,
    pub decimals0: u8,
    pub decimals1: u8,
    /// Wall-clock time of the read
    pub read_at: u64,
}

/// External price feed (Chainlink-compatible aggregator).
#[async_trait]
pub trait FeedReader: Send + Sync {
    /// Latest answer with its update timestamp.
    async fn latest_feed(&self, feed: Address) -> Result<FeedValue, ReadError>;
}

/// Topology-specific pool reads.
#[async_trait]
pub trait PoolReader: Send + Sync {
    /// Two-coin Curve pool. `is_ng` selects the NG interface.
    async fn curve_duo(&self, pool: Address, is_ng: bool) -> Result<CurvePoolState, ReadError>;

    /// Tricrypto pool, EMA of coin `k + 1` against coin 0.
    async fn curve_tri(&self, pool: Address, k: u8) -> Result<CurvePoolState, ReadError>;

    /// Uniswap V2 reserves.
    async fn uni_v2(&self, pool: Address) -> Result<UniV2State, ReadError>;

    /// Uniswap V3 tick cumulatives over `window` seconds.
    async fn uni_v3_twap(&self, pool: Address, window: u32) -> Result<UniV3State, ReadError>;
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
