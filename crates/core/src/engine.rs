//! Price query engine.
//!
//! Resolves a token's strategy from one registry snapshot, reads the
//! source, runs the strategy and, in verified mode, applies the
//! verification policy.
//!
//! Reference prices (the ETH conversion and stable cross-checks) go
//! through a separate base-tier path that only accepts configs needing no
//! further lookups. The base path never calls back into the derived path,
//! so resolution depth is bounded at one level by construction.

use alloy::primitives::{Address, U256};
use futures::future::{join_all, try_join_all};
use oracle_chain::{unix_now, FeedReader, FeedValue, PoolReader, ReadError};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::OracleError;
use crate::params::{StrategyKind, StrategyParams};
use crate::registry::{ConfigRegistry, RegistrySnapshot};
use crate::strategy::{
    curve_duo_price, curve_tri_price, stable_price, uni_v2_price, uni_v3_price, Candidate,
};
use crate::verification::{
    check_bounds, check_cross_stable, check_delta, check_staleness, convert_eth,
};

/// Source of "now" for staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        unix_now()
    }
}

/// Settable time, for replays and tests.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Whether a query runs the verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Verified,
    Unverified,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
        }
    }
}

/// A resolved price with the metadata it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub token: Address,
    /// WAD price in the reference unit
    pub price: U256,
    /// Oldest input timestamp, ETH conversion included
    pub source_timestamp: u64,
    pub kind: StrategyKind,
}

/// Verification context for one query. `None` means unverified.
type Verify = Option<u64>;

/// Multi-source price oracle.
pub struct OracleEngine {
    registry: Arc<ConfigRegistry>,
    feeds: Arc<dyn FeedReader>,
    pools: Arc<dyn PoolReader>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for OracleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleEngine")
            .field("registry", &self.registry)
            .finish()
    }
}

impl OracleEngine {
    /// Create an engine on the system clock.
    pub fn new(
        registry: Arc<ConfigRegistry>,
        feeds: Arc<dyn FeedReader>,
        pools: Arc<dyn PoolReader>,
    ) -> Self {
        Self {
            registry,
            feeds,
            pools,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for staleness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Strategy output with arithmetic checks only.
    pub async fn get_price_unverified(&self, token: Address) -> Result<U256, OracleError> {
        Ok(self.get_quote_unverified(token).await?.price)
    }

    /// Strategy output that passed every verification check.
    pub async fn get_price_verified(&self, token: Address) -> Result<U256, OracleError> {
        Ok(self.get_quote_verified(token).await?.price)
    }

    pub async fn get_quote_unverified(&self, token: Address) -> Result<PriceQuote, OracleError> {
        self.get_quote(token, QueryMode::Unverified).await
    }

    pub async fn get_quote_verified(&self, token: Address) -> Result<PriceQuote, OracleError> {
        self.get_quote(token, QueryMode::Verified).await
    }

    /// Quote `token` in the given mode against the current snapshot.
    pub async fn get_quote(
        &self,
        token: Address,
        mode: QueryMode,
    ) -> Result<PriceQuote, OracleError> {
        let snapshot = self.registry.snapshot();
        let result = self.quote(&snapshot, token, self.verify(mode)).await;
        log_outcome(token, mode, &result);
        result
    }

    /// Verify two prices against one snapshot.
    ///
    /// Both reads run concurrently; the first failure observed is returned.
    pub async fn get_and_verify_two_prices(
        &self,
        a: Address,
        b: Address,
    ) -> Result<(U256, U256), OracleError> {
        let snapshot = self.registry.snapshot();
        let verify = self.verify(QueryMode::Verified);

        let (quote_a, quote_b) = futures::try_join!(
            self.quote(&snapshot, a, verify),
            self.quote(&snapshot, b, verify)
        )
        .map_err(|e| {
            warn!(a = %a, b = %b, error = %e, "Price pair rejected");
            e
        })?;

        Ok((quote_a.price, quote_b.price))
    }

    /// Verified prices for a batch, one result per token in input order.
    pub async fn get_prices_verified(
        &self,
        tokens: &[Address],
    ) -> Vec<(Address, Result<U256, OracleError>)> {
        let snapshot = self.registry.snapshot();
        let verify = self.verify(QueryMode::Verified);

        let results = join_all(
            tokens
                .iter()
                .map(|token| self.quote(&snapshot, *token, verify)),
        )
        .await;

        tokens
            .iter()
            .zip(results)
            .map(|(token, result)| {
                log_outcome(*token, QueryMode::Verified, &result);
                (*token, result.map(|q| q.price))
            })
            .collect()
    }

    fn verify(&self, mode: QueryMode) -> Verify {
        match mode {
            QueryMode::Verified => Some(self.clock.now()),
            QueryMode::Unverified => None,
        }
    }

    /// Derived tier: any config, may consult ETH and stables once.
    async fn quote(
        &self,
        snapshot: &RegistrySnapshot,
        token: Address,
        verify: Verify,
    ) -> Result<PriceQuote, OracleError> {
        let params = snapshot.entry(token)?;
        let common = params.common();
        let candidate = self.candidate(token, params).await?;

        if let Some(now) = verify {
            check_staleness(token, common, candidate.source_timestamp, now)?;
        }

        let mut price = candidate.price;
        let mut source_timestamp = candidate.source_timestamp;
        if common.is_eth_price_related {
            let eth = self
                .base_quote(snapshot, self.registry.eth_token(), verify)
                .await?;
            price = convert_eth(token, price, eth.price)?;
            source_timestamp = source_timestamp.min(eth.source_timestamp);
        }

        if verify.is_some() {
            check_bounds(token, common, price)?;
            if let Some(reference) = candidate.aggregator_reference {
                check_delta(token, common, price, reference)?;
            }

            let stables = params.stables_to_check();
            if !stables.is_empty() {
                let quotes = try_join_all(
                    stables
                        .iter()
                        .map(|stable| self.base_quote(snapshot, *stable, verify)),
                )
                .await?;
                let stable_prices: SmallVec<[U256; 4]> = quotes.iter().map(|q| q.price).collect();
                check_cross_stable(token, common, price, &stable_prices)?;
            }
        }

        Ok(PriceQuote {
            token,
            price,
            source_timestamp,
            kind: params.kind(),
        })
    }

    /// Base tier: only configs priced without other tokens.
    async fn base_quote(
        &self,
        snapshot: &RegistrySnapshot,
        token: Address,
        verify: Verify,
    ) -> Result<PriceQuote, OracleError> {
        let params = snapshot.entry(token)?;
        if !params.is_base() {
            return Err(OracleError::DerivedReference { token });
        }
        let common = params.common();
        let candidate = self.candidate(token, params).await?;

        if let Some(now) = verify {
            check_staleness(token, common, candidate.source_timestamp, now)?;
            check_bounds(token, common, candidate.price)?;
            if let Some(reference) = candidate.aggregator_reference {
                check_delta(token, common, candidate.price, reference)?;
            }
        }

        debug!(token = %token, price = %candidate.price, "Reference price resolved");

        Ok(PriceQuote {
            token,
            price: candidate.price,
            source_timestamp: candidate.source_timestamp,
            kind: params.kind(),
        })
    }

    async fn candidate(
        &self,
        token: Address,
        params: &StrategyParams,
    ) -> Result<Candidate, OracleError> {
        self.read_candidate(params)
            .await
            .map_err(|e| OracleError::unavailable(token, e))
    }

    /// Read the source and run the strategy.
    async fn read_candidate(&self, params: &StrategyParams) -> Result<Candidate, ReadError> {
        match params {
            StrategyParams::Stable(p) => {
                let feed = self.feeds.latest_feed(p.aggregator_oracle).await?;
                stable_price(p, &feed)
            }
            StrategyParams::CurveDuo(p) => {
                let state = self.pools.curve_duo(p.pool_address, p.is_ng).await?;
                curve_duo_price(p, &state)
            }
            StrategyParams::CurveTri(p) => {
                let state = self.pools.curve_tri(p.pool_address, p.k).await?;
                curve_tri_price(p, &state)
            }
            StrategyParams::UniV2(p) => {
                let (state, aggregator) = futures::try_join!(
                    self.pools.uni_v2(p.pool_address),
                    self.optional_feed(p.aggregator_oracle)
                )?;
                uni_v2_price(p, &state, aggregator.as_ref())
            }
            StrategyParams::UniV3(p) => {
                let (state, aggregator) = futures::try_join!(
                    self.pools.uni_v3_twap(p.pool_address, p.twap_window),
                    self.optional_feed(p.aggregator_oracle)
                )?;
                uni_v3_price(p, &state, aggregator.as_ref())
            }
        }
    }

    async fn optional_feed(&self, feed: Option<Address>) -> Result<Option<FeedValue>, ReadError> {
        match feed {
            Some(feed) => self.feeds.latest_feed(feed).await.map(Some),
            None => Ok(None),
        }
    }
}

fn log_outcome(token: Address, mode: QueryMode, result: &Result<PriceQuote, OracleError>) {
    match result {
        Ok(quote) => debug!(
            token = %token,
            mode = mode.as_str(),
            kind = %quote.kind,
            price = %quote.price,
            source_timestamp = quote.source_timestamp,
            "Price resolved"
        ),
        Err(e) => warn!(
            token = %token,
            mode = mode.as_str(),
            error_kind = e.kind(),
            configuration = e.is_configuration_error(),
            error = %e,
            "Price query failed"
        ),
    }
}
