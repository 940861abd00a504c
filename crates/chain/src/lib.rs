//! Oracle chain interaction layer.
//!
//! This crate provides the read-only side of the price oracle:
//! - [`FeedReader`] / [`PoolReader`] traits and the raw state they return
//! - Contract bindings for Chainlink aggregators, Curve and Uniswap pools
//! - One adapter per pool topology, composed by [`OnChainReader`]
//! - Provider management for the RPC connection
//!
//! Nothing here caches pool state or interprets prices.

pub mod contracts;
pub mod oracle;
pub mod pools;
mod provider;
mod reader;

pub use oracle::{ChainlinkFeedReader, FeedValue, RoundData};
pub use pools::{CurveReader, TokenDecimals, UniswapV2Reader, UniswapV3Reader};
pub use provider::{OnChainReader, ProviderManager};
pub use reader::{
    unix_now, CurvePoolState, FeedReader, PoolReader, ReadError, UniV2State, UniV3State,
};
