// In crates/api-client/src/cache.rs

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use core_types::Symbol;

use crate::types::CandleRequest;

/// Identifies one fetched series: `symbol-days-interval-start-end`, with
/// the range bounds in unix milliseconds or `none` when unset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub days: u32,
    pub interval: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl From<&CandleRequest> for CacheKey {
    fn from(request: &CandleRequest) -> Self {
        Self {
            symbol: request.symbol.clone(),
            days: request.days,
            interval: request.interval.clone(),
            start: request.start,
            end: request.end,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |t: Option<DateTime<Utc>>| match t {
            Some(t) => t.timestamp_millis().to_string(),
            None => "none".to_string(),
        };
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.symbol,
            self.days,
            self.interval,
            bound(self.start),
            bound(self.end)
        )
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct CacheState<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    /// Insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

/// A bounded, optionally expiring store of fetched series.
///
/// Shared behind an `Arc`. The lock is only held for lookups and inserts,
/// never while a fetch is in flight, so two callers missing on the same key
/// both fetch and the later insert wins.
pub struct MarketDataCache<V> {
    state: RwLock<CacheState<V>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl<V: Clone> MarketDataCache<V> {
    /// `capacity` is clamped to at least one entry. With `ttl` unset,
    /// entries stay until evicted.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Builds the cache from `market_data` settings, where a TTL of `0`
    /// seconds disables expiry.
    pub fn from_settings(settings: &app_config::MarketDataSettings) -> Self {
        let ttl = (settings.cache_ttl_secs > 0).then(|| Duration::from_secs(settings.cache_ttl_secs));
        Self::new(settings.cache_capacity, ttl)
    }

    /// Returns the live value stored under `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let state = self.read();
        let entry = state.entries.get(key)?;
        if self.is_expired(entry) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value` under `key`, evicting the oldest entries beyond
    /// capacity.
    pub fn insert(&self, key: CacheKey, value: V) {
        let mut state = self.write();
        if state.entries.contains_key(&key) {
            state.order.retain(|k| k != &key);
        }
        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );

        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "Evicted market data cache entry");
        }
    }

    /// Returns the cached value for `key`, or awaits `fetch` and caches
    /// its result. A failed fetch stores nothing, so the next call for the
    /// same key tries again.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &CacheKey, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            tracing::debug!(key = %key, "Market data cache hit");
            return Ok(value);
        }

        tracing::debug!(key = %key, "Market data cache miss");
        let value = fetch().await?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.order.clear();
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        self.ttl.is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<V>> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Market data cache lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<V>> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Market data cache lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }
}
