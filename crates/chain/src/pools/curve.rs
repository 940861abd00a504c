//! Curve pool adapter.

use crate::contracts::{ICurveCryptoPool, ICurveStableNgPool, ICurveTriCryptoPool};
use crate::reader::{CurvePoolState, ReadError};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::debug;

/// Reads EMA prices from Curve pools.
#[derive(Clone)]
pub struct CurveReader<P> {
    provider: Arc<P>,
}

impl<P> std::fmt::Debug for CurveReader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurveReader").finish()
    }
}

impl<P: Provider + Clone + Send + Sync + 'static> CurveReader<P> {
    /// Create a new Curve reader.
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Two-coin pool read. `is_ng` selects the NG interface.
    pub async fn read_duo(&self, pool: Address, is_ng: bool) -> Result<CurvePoolState, ReadError> {
        let state = if is_ng {
            self.read_duo_ng(pool).await?
        } else {
            self.read_duo_legacy(pool).await?
        };

        debug!(
            pool = %pool,
            is_ng = is_ng,
            price_oracle = %state.price_oracle,
            last_update = state.last_update,
            "Read Curve two-coin pool"
        );

        check_state(pool, state)
    }

    async fn read_duo_legacy(&self, pool: Address) -> Result<CurvePoolState, ReadError> {
        let contract = ICurveCryptoPool::new(pool, &*self.provider);

        let price_call = contract.price_oracle();
        let timestamp_call = contract.last_prices_timestamp();
        let virtual_price_call = contract.get_virtual_price();

        let (price, timestamp, virtual_price) = futures::try_join!(
            price_call.call().into_future(),
            timestamp_call.call().into_future(),
            virtual_price_call.call().into_future()
        )
        .map_err(|e| ReadError::unreachable(pool, e))?;

        Ok(CurvePoolState {
            price_oracle: price._0,
            virtual_price: virtual_price._0,
            last_update: timestamp._0.saturating_to::<u64>(),
        })
    }

    async fn read_duo_ng(&self, pool: Address) -> Result<CurvePoolState, ReadError> {
        let contract = ICurveStableNgPool::new(pool, &*self.provider);

        let price_call = contract.price_oracle(U256::ZERO);
        let ma_time_call = contract.ma_last_time();
        let virtual_price_call = contract.get_virtual_price();

        let (price, ma_time, virtual_price) = futures::try_join!(
            price_call.call().into_future(),
            ma_time_call.call().into_future(),
            virtual_price_call.call().into_future()
        )
        .map_err(|e| ReadError::unreachable(pool, e))?;

        Ok(CurvePoolState {
            price_oracle: price._0,
            virtual_price: virtual_price._0,
            last_update: price_ema_time(ma_time._0),
        })
    }

    /// Tricrypto read for coin `k + 1`.
    pub async fn read_tri(&self, pool: Address, k: u8) -> Result<CurvePoolState, ReadError> {
        let contract = ICurveTriCryptoPool::new(pool, &*self.provider);

        let price_call = contract.price_oracle(U256::from(k));
        let timestamp_call = contract.last_prices_timestamp();
        let virtual_price_call = contract.get_virtual_price();

        let (price, timestamp, virtual_price) = futures::try_join!(
            price_call.call().into_future(),
            timestamp_call.call().into_future(),
            virtual_price_call.call().into_future()
        )
        .map_err(|e| ReadError::unreachable(pool, e))?;

        let state = CurvePoolState {
            price_oracle: price._0,
            virtual_price: virtual_price._0,
            last_update: timestamp._0.saturating_to::<u64>(),
        };

        debug!(
            pool = %pool,
            k = k,
            price_oracle = %state.price_oracle,
            last_update = state.last_update,
            "Read Curve tricrypto pool"
        );

        check_state(pool, state)
    }
}

/// Price EMA time from NG `ma_last_time()`.
///
/// The low 128 bits hold the price EMA time, the high 128 bits the D EMA time.
fn price_ema_time(packed: U256) -> u64 {
    (packed & U256::from(u128::MAX)).saturating_to::<u64>()
}

/// Reject empty or unpriced pools.
fn check_state(pool: Address, state: CurvePoolState) -> Result<CurvePoolState, ReadError> {
    if state.virtual_price.is_zero() {
        return Err(ReadError::degenerate(pool, "zero virtual price"));
    }
    if state.price_oracle.is_zero() {
        return Err(ReadError::degenerate(pool, "zero oracle price"));
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_state_rejects_empty_pool() {
        let pool = Address::repeat_byte(3);
        let empty = CurvePoolState {
            price_oracle: U256::from(1u64),
            virtual_price: U256::ZERO,
            last_update: 1700000000,
        };
        assert!(matches!(
            check_state(pool, empty),
            Err(ReadError::Degenerate { .. })
        ));

        let healthy = CurvePoolState {
            price_oracle: U256::from(10u128.pow(18)),
            virtual_price: U256::from(10u128.pow(18)),
            last_update: 1700000000,
        };
        assert_eq!(check_state(pool, healthy), Ok(healthy));
    }

    #[test]
    fn test_price_ema_time_unpacks_low_half() {
        let price_time = U256::from(1_700_000_000u64);
        let d_time = U256::from(1_700_000_500u64) << 128;
        assert_eq!(price_ema_time(d_time | price_time), 1_700_000_000);
        assert_eq!(price_ema_time(price_time), 1_700_000_000);
        assert_eq!(price_ema_time(d_time), 0);
    }
}
