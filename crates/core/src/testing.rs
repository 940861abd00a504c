//! In-memory sources for engine tests.

use alloy::primitives::Address;
use async_trait::async_trait;
use oracle_chain::{
    CurvePoolState, FeedReader, FeedValue, PoolReader, ReadError, UniV2State, UniV3State,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Feeds and pools keyed by address. Anything not set reads as unreachable.
#[derive(Default)]
pub struct MockSources {
    feeds: Mutex<HashMap<Address, FeedValue>>,
    curve_duo: Mutex<HashMap<Address, CurvePoolState>>,
    curve_tri: Mutex<HashMap<(Address, u8), CurvePoolState>>,
    uni_v2: Mutex<HashMap<Address, UniV2State>>,
    uni_v3: Mutex<HashMap<Address, UniV3State>>,
    reads: AtomicUsize,
}

impl MockSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feed(&self, feed: Address, value: FeedValue) {
        self.feeds.lock().insert(feed, value);
    }

    pub fn remove_feed(&self, feed: Address) {
        self.feeds.lock().remove(&feed);
    }

    pub fn set_curve_duo(&self, pool: Address, state: CurvePoolState) {
        self.curve_duo.lock().insert(pool, state);
    }

    pub fn set_curve_tri(&self, pool: Address, k: u8, state: CurvePoolState) {
        self.curve_tri.lock().insert((pool, k), state);
    }

    pub fn set_uni_v2(&self, pool: Address, state: UniV2State) {
        self.uni_v2.lock().insert(pool, state);
    }

    pub fn set_uni_v3(&self, pool: Address, state: UniV3State) {
        self.uni_v3.lock().insert(pool, state);
    }

    /// Total reads served, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn lookup<K, V>(&self, map: &Mutex<HashMap<K, V>>, key: K, address: Address) -> Result<V, ReadError>
    where
        K: std::hash::Hash + Eq,
        V: Copy,
    {
        self.reads.fetch_add(1, Ordering::Relaxed);
        map.lock()
            .get(&key)
            .copied()
            .ok_or_else(|| ReadError::unreachable(address, "execution reverted"))
    }
}

#[async_trait]
impl FeedReader for MockSources {
    async fn latest_feed(&self, feed: Address) -> Result<FeedValue, ReadError> {
        self.lookup(&self.feeds, feed, feed)
    }
}

#[async_trait]
impl PoolReader for MockSources {
    async fn curve_duo(&self, pool: Address, _is_ng: bool) -> Result<CurvePoolState, ReadError> {
        self.lookup(&self.curve_duo, pool, pool)
    }

    async fn curve_tri(&self, pool: Address, k: u8) -> Result<CurvePoolState, ReadError> {
        self.lookup(&self.curve_tri, (pool, k), pool)
    }

    async fn uni_v2(&self, pool: Address) -> Result<UniV2State, ReadError> {
        self.lookup(&self.uni_v2, pool, pool)
    }

    async fn uni_v3_twap(&self, pool: Address, window: u32) -> Result<UniV3State, ReadError> {
        let state = self.lookup(&self.uni_v3, pool, pool)?;
        if state.window != window {
            return Err(ReadError::degenerate(pool, "observation window mismatch"));
        }
        Ok(state)
    }
}
