// In crates/api-client/src/provider.rs

use app_config::UniverseSettings;
use async_trait::async_trait;
use core_types::{Result, Symbol};
use serde_json::Value;

use crate::types::CandleRequest;

/// The upstream supplier of raw candle payloads.
///
/// Implementations return the payload untouched; normalization happens in
/// [`crate::MarketData`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Value>;
}

/// Supplies the default list of symbols to scan.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn fetch_universe(&self) -> Result<Vec<Symbol>>;
}

/// A fixed universe, listed in the config file or in a separate TOML file.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<Symbol>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .map(Symbol)
            .collect();
        Self { symbols }
    }

    /// Inline symbols first, followed by those read from `universe.file`.
    pub fn from_settings(settings: &UniverseSettings) -> app_config::Result<Self> {
        let mut symbols = settings.symbols.clone();
        if let Some(path) = &settings.file {
            symbols.extend(app_config::load_universe_file(path)?);
        }
        Ok(Self::new(symbols))
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[async_trait]
impl UniverseSource for StaticUniverse {
    async fn fetch_universe(&self) -> Result<Vec<Symbol>> {
        Ok(self.symbols.clone())
    }
}
