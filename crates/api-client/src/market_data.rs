// In crates/api-client/src/market_data.rs

use std::sync::Arc;

use core_types::{CandleSeries, Result};

use crate::cache::{CacheKey, MarketDataCache};
use crate::normalize::normalize;
use crate::provider::MarketDataProvider;
use crate::types::CandleRequest;

/// Normalized candles from a provider, optionally served through a cache.
#[derive(Clone)]
pub struct MarketData {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<MarketDataCache<CandleSeries>>,
}

impl MarketData {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<MarketDataCache<CandleSeries>>) -> Self {
        Self { provider, cache }
    }

    /// Fetches and normalizes the candles for `request`.
    ///
    /// With `use_cache` the series is looked up by its [`CacheKey`] first and
    /// stored after a successful fetch. Without it the provider is always
    /// called and the cache is left untouched.
    pub async fn candles(&self, request: &CandleRequest, use_cache: bool) -> Result<CandleSeries> {
        if !use_cache {
            return self.fetch(request).await;
        }
        let key = CacheKey::from(request);
        self.cache.get_or_fetch(&key, || self.fetch(request)).await
    }

    pub fn cache(&self) -> &MarketDataCache<CandleSeries> {
        &self.cache
    }

    async fn fetch(&self, request: &CandleRequest) -> Result<CandleSeries> {
        let raw = self.provider.fetch_candles(request).await?;
        let series = normalize(&raw)?;
        tracing::debug!(symbol = %request.symbol, candles = series.len(), "Fetched candles");
        Ok(series)
    }
}
