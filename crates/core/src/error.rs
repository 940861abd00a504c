//! Oracle error taxonomy.

use alloy::primitives::{Address, U256};
use oracle_chain::ReadError;
use thiserror::Error;

use crate::params::StrategyKind;

/// Everything a price query or a governance call can fail with.
///
/// Configuration errors are deterministic for a given registry snapshot.
/// Market errors depend on live source state and may clear on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("token {token} has no pool type assigned")]
    Unconfigured { token: Address },

    #[error("token {token} is assigned {assigned}, params given for {provided}")]
    WrongPoolType {
        token: Address,
        assigned: StrategyKind,
        provided: StrategyKind,
    },

    #[error("no {kind} params set for token {token}")]
    ParamsNotSet { token: Address, kind: StrategyKind },

    #[error("caller {caller} is not a governor")]
    Unauthorized { caller: Address },

    #[error("invalid params for token {token}: {reason}")]
    InvalidParams { token: Address, reason: String },

    /// A base-tier lookup (ETH or a cross-check stable) hit a config that
    /// itself needs ETH conversion or stable cross-checks.
    #[error("token {token} cannot serve as a reference price: its config is derived")]
    DerivedReference { token: Address },

    #[error("source unavailable for token {token}: {source}")]
    SourceUnavailable {
        token: Address,
        #[source]
        source: ReadError,
    },

    #[error("price for token {token} is stale: updated at {updated_at}, now {now}, max age {max_age}s")]
    StalePrice {
        token: Address,
        updated_at: u64,
        now: u64,
        max_age: u64,
    },

    #[error("price {price} for token {token} outside bounds [{min}, {max}]")]
    PriceOutOfBounds {
        token: Address,
        price: U256,
        min: U256,
        max: U256,
    },

    #[error("price {price} for token {token} deviates {deviation} from reference {reference} (limit {limit})")]
    DeltaExceeded {
        token: Address,
        price: U256,
        reference: U256,
        deviation: U256,
        limit: u32,
    },
}

impl OracleError {
    pub(crate) fn unavailable(token: Address, source: ReadError) -> Self {
        Self::SourceUnavailable { token, source }
    }

    pub(crate) fn invalid(token: Address, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            token,
            reason: reason.into(),
        }
    }

    /// Stable identifier of the variant, used for logging and parity diffs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unconfigured { .. } => "unconfigured",
            Self::WrongPoolType { .. } => "wrong_pool_type",
            Self::ParamsNotSet { .. } => "params_not_set",
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidParams { .. } => "invalid_params",
            Self::DerivedReference { .. } => "derived_reference",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::StalePrice { .. } => "stale_price",
            Self::PriceOutOfBounds { .. } => "price_out_of_bounds",
            Self::DeltaExceeded { .. } => "delta_exceeded",
        }
    }

    /// Errors fixed by governance, not by waiting.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Unconfigured { .. }
                | Self::WrongPoolType { .. }
                | Self::ParamsNotSet { .. }
                | Self::Unauthorized { .. }
                | Self::InvalidParams { .. }
                | Self::DerivedReference { .. }
        )
    }

    /// Errors caused by live source state.
    pub fn is_market_error(&self) -> bool {
        !self.is_configuration_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let token = Address::repeat_byte(0x11);

        let unconfigured = OracleError::Unconfigured { token };
        assert!(unconfigured.is_configuration_error());
        assert!(!unconfigured.is_market_error());

        let stale = OracleError::StalePrice {
            token,
            updated_at: 100,
            now: 5000,
            max_age: 3600,
        };
        assert!(stale.is_market_error());
        assert_eq!(stale.kind(), "stale_price");

        let source = OracleError::unavailable(token, ReadError::degenerate(token, "empty reserves"));
        assert!(source.is_market_error());
        assert!(source.to_string().contains("empty reserves"));
    }

    #[test]
    fn test_wrong_pool_type_message() {
        let err = OracleError::WrongPoolType {
            token: Address::ZERO,
            assigned: StrategyKind::CurveDuo,
            provided: StrategyKind::UniV3,
        };
        let msg = err.to_string();
        assert!(msg.contains("curve_duo"));
        assert!(msg.contains("uni_v3"));
    }
}
