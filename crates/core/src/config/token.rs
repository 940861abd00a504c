//! Per-token configuration loading from TOML.

use alloy::primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::params::{
    CommonParams, CurveDuoParams, CurveTriParams, StableParams, StableSet, StrategyKind,
    StrategyParams, UniV2Params, UniV3Params,
};
use crate::u256_math::parse_wad;

/// One `[[tokens]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Symbol, used in logs and as a reference name in `stables_to_check`
    pub symbol: String,
    /// Token contract address (as hex string)
    pub token: String,
    pub pool_type: StrategyKind,
    /// Decimal string, e.g. "0.995"
    pub min_price: String,
    /// Decimal string, e.g. "1.005"
    pub max_price: String,
    /// Max deviation from the reference, 100000 = 100%
    #[serde(default)]
    pub delta_limit: u32,
    /// Max source age in seconds
    pub max_last_update: u64,
    #[serde(default)]
    pub is_reversed: bool,
    #[serde(default)]
    pub is_eth_price_related: bool,
    #[serde(default)]
    pub aggregator_oracle: Option<String>,
    #[serde(default)]
    pub pool_address: Option<String>,
    /// Tricrypto coin index
    #[serde(default)]
    pub k: Option<u8>,
    /// Uniswap V3 TWAP window in seconds
    #[serde(default)]
    pub twap_window: Option<u32>,
    #[serde(default)]
    pub is_ng: bool,
    /// Symbols or addresses of tokens to cross-check against
    #[serde(default)]
    pub stables_to_check: Vec<String>,
}

impl TokenConfig {
    /// Parse token address.
    pub fn token_address(&self) -> Result<Address> {
        parse_address(&self.token).with_context(|| format!("token {}", self.symbol))
    }

    /// Shared verification settings.
    pub fn common(&self) -> Result<CommonParams> {
        Ok(CommonParams {
            delta_limit: self.delta_limit,
            min_price: parse_price(&self.min_price)
                .with_context(|| format!("{} min_price", self.symbol))?,
            max_price: parse_price(&self.max_price)
                .with_context(|| format!("{} max_price", self.symbol))?,
            max_last_update: self.max_last_update,
            is_reversed: self.is_reversed,
            is_eth_price_related: self.is_eth_price_related,
        })
    }

    /// Build strategy params, resolving `stables_to_check` through `resolve`.
    pub fn to_params(&self, resolve: impl Fn(&str) -> Result<Address>) -> Result<StrategyParams> {
        let common = self.common()?;
        let stables = self
            .stables_to_check
            .iter()
            .map(|s| resolve(s))
            .collect::<Result<StableSet>>()
            .with_context(|| format!("{} stables_to_check", self.symbol))?;

        if !stables.is_empty()
            && !matches!(
                self.pool_type,
                StrategyKind::CurveDuo | StrategyKind::CurveTri | StrategyKind::UniV2
            )
        {
            bail!(
                "{}: stables_to_check is not supported for {}",
                self.symbol,
                self.pool_type
            );
        }

        if self.pool_type == StrategyKind::Stable && self.pool_address.is_some() {
            bail!(
                "{}: stable tokens are priced from a feed, pool_address must be absent",
                self.symbol
            );
        }

        let params = match self.pool_type {
            StrategyKind::Stable => StrategyParams::Stable(StableParams {
                common,
                aggregator_oracle: self.required_address("aggregator_oracle", &self.aggregator_oracle)?,
            }),
            StrategyKind::CurveDuo => StrategyParams::CurveDuo(CurveDuoParams {
                common,
                pool_address: self.required_address("pool_address", &self.pool_address)?,
                is_ng: self.is_ng,
                stables_to_check: stables,
            }),
            StrategyKind::CurveTri => StrategyParams::CurveTri(CurveTriParams {
                common,
                pool_address: self.required_address("pool_address", &self.pool_address)?,
                k: self
                    .k
                    .ok_or_else(|| anyhow!("{}: curve_tri requires k", self.symbol))?,
                stables_to_check: stables,
            }),
            StrategyKind::UniV2 => StrategyParams::UniV2(UniV2Params {
                common,
                pool_address: self.required_address("pool_address", &self.pool_address)?,
                aggregator_oracle: self.optional_address(&self.aggregator_oracle)?,
                stables_to_check: stables,
            }),
            StrategyKind::UniV3 => StrategyParams::UniV3(UniV3Params {
                common,
                pool_address: self.required_address("pool_address", &self.pool_address)?,
                aggregator_oracle: self.optional_address(&self.aggregator_oracle)?,
                twap_window: self
                    .twap_window
                    .ok_or_else(|| anyhow!("{}: uni_v3 requires twap_window", self.symbol))?,
            }),
        };
        Ok(params)
    }

    fn required_address(&self, field: &str, value: &Option<String>) -> Result<Address> {
        let value = value
            .as_deref()
            .ok_or_else(|| anyhow!("{}: {} requires {}", self.symbol, self.pool_type, field))?;
        parse_address(value).with_context(|| format!("{} {}", self.symbol, field))
    }

    fn optional_address(&self, value: &Option<String>) -> Result<Option<Address>> {
        value
            .as_deref()
            .map(parse_address)
            .transpose()
            .with_context(|| format!("{} aggregator_oracle", self.symbol))
    }
}

pub(crate) fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .map_err(|e| anyhow!("Invalid address '{}': {}", s, e))
}

fn parse_price(s: &str) -> Result<alloy::primitives::U256> {
    parse_wad(s).ok_or_else(|| anyhow!("Invalid decimal price '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::u256_math::WAD;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    fn parse(toml_str: &str) -> TokenConfig {
        toml::from_str(toml_str).unwrap()
    }

    fn no_refs(s: &str) -> Result<Address> {
        Err(anyhow!("unexpected reference {s}"))
    }

    #[test]
    fn test_stable_entry() {
        let config = parse(
            r#"
            symbol = "USDC"
            token = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
            pool_type = "stable"
            min_price = "0.995"
            max_price = "1.005"
            max_last_update = 21600
            aggregator_oracle = "0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6"
        "#,
        );

        assert_eq!(config.token_address().unwrap(), USDC.parse::<Address>().unwrap());
        let params = config.to_params(no_refs).unwrap();
        assert_eq!(params.kind(), StrategyKind::Stable);
        assert_eq!(params.common().max_price, parse_wad("1.005").unwrap());
        assert_eq!(params.common().delta_limit, 0);
        assert!(!params.common().is_reversed);
    }

    #[test]
    fn test_curve_duo_with_stables() {
        let config = parse(
            r#"
            symbol = "crvUSD"
            token = "0xf939E0A03FB07F59A73314E73794Be0E57ac1b4E"
            pool_type = "curve_duo"
            min_price = "0.98"
            max_price = "1.02"
            delta_limit = 2000
            max_last_update = 3600
            pool_address = "0x4DEcE678ceceb27446b35C672dC7d61F30bAD69E"
            is_ng = true
            stables_to_check = ["USDC"]
        "#,
        );

        let usdc: Address = USDC.parse().unwrap();
        let params = config
            .to_params(|s| {
                assert_eq!(s, "USDC");
                Ok(usdc)
            })
            .unwrap();

        match params {
            StrategyParams::CurveDuo(p) => {
                assert!(p.is_ng);
                assert_eq!(p.stables_to_check.as_slice(), &[usdc]);
                assert_eq!(p.common.delta_limit, 2000);
            }
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let config = parse(
            r#"
            symbol = "X"
            token = "0x1111111111111111111111111111111111111111"
            pool_type = "uni_v3"
            min_price = "1"
            max_price = "2"
            max_last_update = 60
            pool_address = "0x2222222222222222222222222222222222222222"
        "#,
        );
        let err = config.to_params(no_refs).unwrap_err();
        assert!(err.to_string().contains("twap_window"));

        let mut tri = config.clone();
        tri.pool_type = StrategyKind::CurveTri;
        assert!(tri.to_params(no_refs).is_err());

        let mut stable = config;
        stable.pool_type = StrategyKind::Stable;
        assert!(stable.to_params(no_refs).is_err());
    }

    #[test]
    fn test_stables_rejected_for_uni_v3() {
        let mut config = parse(
            r#"
            symbol = "X"
            token = "0x1111111111111111111111111111111111111111"
            pool_type = "uni_v3"
            min_price = "1"
            max_price = "2"
            max_last_update = 60
            pool_address = "0x2222222222222222222222222222222222222222"
            twap_window = 1800
        "#,
        );
        assert!(config.to_params(no_refs).is_ok());

        config.stables_to_check = vec![USDC.to_string()];
        assert!(config.to_params(|s| parse_address(s)).is_err());
    }

    #[test]
    fn test_bad_price_string() {
        let mut config = parse(
            r#"
            symbol = "X"
            token = "0x1111111111111111111111111111111111111111"
            pool_type = "stable"
            min_price = "1"
            max_price = "2"
            max_last_update = 60
            aggregator_oracle = "0x2222222222222222222222222222222222222222"
        "#,
        );
        assert_eq!(config.common().unwrap().min_price, WAD);

        config.max_price = "two".to_string();
        assert!(config.common().is_err());
    }

    #[test]
    fn test_stable_rejects_pool_address() {
        let mut config = parse(
            r#"
            symbol = "X"
            token = "0x1111111111111111111111111111111111111111"
            pool_type = "stable"
            min_price = "1"
            max_price = "2"
            max_last_update = 60
            aggregator_oracle = "0x2222222222222222222222222222222222222222"
            pool_address = "0x3333333333333333333333333333333333333333"
        "#,
        );
        let err = config.to_params(no_refs).unwrap_err();
        assert!(err.to_string().contains("pool_address"));

        config.pool_address = None;
        assert!(config.to_params(no_refs).is_ok());
    }
}
