//! Contract bindings for price sources.
//!
//! Only the read-only subset each adapter needs is declared here. Nothing in
//! this crate sends transactions.
//!
//! # Example
//!
//! ```rust,ignore
//! use oracle_chain::contracts::IUniswapV2Pair;
//!
//! let pair = IUniswapV2Pair::new(address, &provider);
//! let reserves = pair.getReserves().call().await?;
//! ```

pub mod common;
pub mod pools;

pub use common::{IAggregatorV3, IERC20Metadata};
pub use pools::{ICurveCryptoPool, ICurveStableNgPool, ICurveTriCryptoPool, IUniswapV2Pair, IUniswapV3Pool};
