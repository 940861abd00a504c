//! Per-token pricing parameters.
//!
//! A token is assigned exactly one [`StrategyKind`]; the matching
//! [`StrategyParams`] variant carries the common verification settings
//! plus whatever the strategy needs to locate its source.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::error::OracleError;
use crate::u256_math::DELTA_DENOMINATOR;

/// Tokens whose verified prices back a cross-stable reference.
pub type StableSet = SmallVec<[Address; 4]>;

/// Pricing strategy a token is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// External aggregator feed
    Stable,
    /// Two-coin Curve pool EMA
    CurveDuo,
    /// Curve tricrypto EMA
    CurveTri,
    /// Uniswap V2 reserve ratio
    UniV2,
    /// Uniswap V3 TWAP
    UniV3,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        Self::Stable,
        Self::CurveDuo,
        Self::CurveTri,
        Self::UniV2,
        Self::UniV3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::CurveDuo => "curve_duo",
            Self::CurveTri => "curve_tri",
            Self::UniV2 => "uni_v2",
            Self::UniV3 => "uni_v3",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonParams {
    /// Max deviation from a reference, scaled by 100000
    pub delta_limit: u32,
    /// Lower price bound (WAD, inclusive)
    pub min_price: U256,
    /// Upper price bound (WAD, inclusive)
    pub max_price: U256,
    /// Max source age in seconds
    pub max_last_update: u64,
    /// Swap the pool's quote/base sides
    pub is_reversed: bool,
    /// Source price is in ETH and must be multiplied by the ETH price
    pub is_eth_price_related: bool,
}

impl CommonParams {
    /// Bounds `[min_price, max_price]` with every other setting neutral.
    pub fn bounded(min_price: U256, max_price: U256, max_last_update: u64) -> Self {
        Self {
            delta_limit: 0,
            min_price,
            max_price,
            max_last_update,
            is_reversed: false,
            is_eth_price_related: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableParams {
    pub common: CommonParams,
    pub aggregator_oracle: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveDuoParams {
    pub common: CommonParams,
    pub pool_address: Address,
    /// Pool implements the NG interface (`price_oracle(uint256)`)
    pub is_ng: bool,
    pub stables_to_check: StableSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveTriParams {
    pub common: CommonParams,
    pub pool_address: Address,
    /// Selects coin `k + 1`, 0 or 1
    pub k: u8,
    pub stables_to_check: StableSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniV2Params {
    pub common: CommonParams,
    pub pool_address: Address,
    pub aggregator_oracle: Option<Address>,
    pub stables_to_check: StableSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniV3Params {
    pub common: CommonParams,
    pub pool_address: Address,
    pub aggregator_oracle: Option<Address>,
    /// TWAP window in seconds
    pub twap_window: u32,
}

/// Parameters for one (token, strategy) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyParams {
    Stable(StableParams),
    CurveDuo(CurveDuoParams),
    CurveTri(CurveTriParams),
    UniV2(UniV2Params),
    UniV3(UniV3Params),
}

impl StrategyParams {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Stable(_) => StrategyKind::Stable,
            Self::CurveDuo(_) => StrategyKind::CurveDuo,
            Self::CurveTri(_) => StrategyKind::CurveTri,
            Self::UniV2(_) => StrategyKind::UniV2,
            Self::UniV3(_) => StrategyKind::UniV3,
        }
    }

    pub fn common(&self) -> &CommonParams {
        match self {
            Self::Stable(p) => &p.common,
            Self::CurveDuo(p) => &p.common,
            Self::CurveTri(p) => &p.common,
            Self::UniV2(p) => &p.common,
            Self::UniV3(p) => &p.common,
        }
    }

    /// Stables whose mean verified price forms the cross-check reference.
    pub fn stables_to_check(&self) -> &[Address] {
        match self {
            Self::CurveDuo(p) => &p.stables_to_check,
            Self::CurveTri(p) => &p.stables_to_check,
            Self::UniV2(p) => &p.stables_to_check,
            Self::Stable(_) | Self::UniV3(_) => &[],
        }
    }

    /// Aggregator used as the delta reference, if any.
    pub fn reference_aggregator(&self) -> Option<Address> {
        match self {
            Self::UniV2(p) => p.aggregator_oracle,
            Self::UniV3(p) => p.aggregator_oracle,
            _ => None,
        }
    }

    /// Source contract read by the strategy.
    pub fn source_address(&self) -> Address {
        match self {
            Self::Stable(p) => p.aggregator_oracle,
            Self::CurveDuo(p) => p.pool_address,
            Self::CurveTri(p) => p.pool_address,
            Self::UniV2(p) => p.pool_address,
            Self::UniV3(p) => p.pool_address,
        }
    }

    /// Priced without consulting any other token.
    ///
    /// Only base configs may back the ETH conversion or a stable cross-check.
    pub fn is_base(&self) -> bool {
        !self.common().is_eth_price_related && self.stables_to_check().is_empty()
    }

    /// Reject parameter sets that could never produce a sound price.
    pub fn validate(&self, token: Address, eth_token: Address) -> Result<(), OracleError> {
        let common = self.common();

        if common.min_price > common.max_price {
            return Err(OracleError::invalid(
                token,
                format!(
                    "min_price {} above max_price {}",
                    common.min_price, common.max_price
                ),
            ));
        }
        if common.delta_limit > DELTA_DENOMINATOR {
            return Err(OracleError::invalid(
                token,
                format!(
                    "delta_limit {} above {}",
                    common.delta_limit, DELTA_DENOMINATOR
                ),
            ));
        }
        if token == eth_token && common.is_eth_price_related {
            return Err(OracleError::invalid(
                token,
                "the ETH token cannot be priced in ETH",
            ));
        }
        if self.source_address().is_zero() {
            return Err(OracleError::invalid(token, "source address is zero"));
        }
        if self.reference_aggregator().is_some_and(|a| a.is_zero()) {
            return Err(OracleError::invalid(token, "aggregator address is zero"));
        }

        let stables = self.stables_to_check();
        for (i, stable) in stables.iter().enumerate() {
            if *stable == token {
                return Err(OracleError::invalid(token, "token lists itself as a stable"));
            }
            if stables[..i].contains(stable) {
                return Err(OracleError::invalid(
                    token,
                    format!("stable {stable} listed twice"),
                ));
            }
        }

        match self {
            Self::CurveTri(p) if p.k > 1 => Err(OracleError::invalid(
                token,
                format!("tricrypto index k={} outside 0..=1", p.k),
            )),
            Self::UniV3(p) if p.twap_window == 0 => {
                Err(OracleError::invalid(token, "twap_window must be positive"))
            }
            _ => Ok(()),
        }
    }
}
