//! Price oracle core logic.
//!
//! This crate provides the pricing side of the oracle:
//! - Per-token strategy params and the governance-controlled registry
//! - Pure pricing strategies (aggregator feed, Curve EMA, Uniswap V2/V3)
//! - Verification policy (staleness, bounds, delta against references)
//! - The query engine with bounded reference resolution
//! - TOML configuration loading and engine parity comparison
//!
//! Source reads are delegated to the `oracle-chain` readers.

pub mod config;
mod engine;
mod error;
pub mod params;
pub mod parity;
mod registry;
pub mod strategy;
pub mod tick_math;
pub mod u256_math;
pub mod verification;

#[cfg(test)]
mod testing;

pub use config::{load_registry, OracleFileConfig, TokenConfig};
pub use engine::{Clock, FixedClock, OracleEngine, PriceQuote, QueryMode, SystemClock};
pub use error::OracleError;
pub use params::{
    CommonParams, CurveDuoParams, CurveTriParams, StableParams, StableSet, StrategyKind,
    StrategyParams, UniV2Params, UniV3Params,
};
pub use parity::{compare_engines, Mismatch, Outcome, ParityReport};
pub use registry::{
    ConfigRegistry, Governance, GovernorSet, RegistryEntry, RegistrySnapshot, SingleGovernor,
};
