// In crates/scanner/src/service.rs

use std::sync::Arc;

use api_client::UniverseSource;
use core_types::Symbol;
use tokio::sync::watch;

use crate::error::{Result, ScanError};
use crate::scanner::Scanner;
use crate::types::{ScanReport, ScanRequest};

/// Entry point for scan invocations coming from the CLI or the HTTP server.
///
/// Resolves the symbol list, validates the request once and hands over to
/// the [`Scanner`].
#[derive(Clone)]
pub struct ScanService {
    scanner: Scanner,
    universe: Arc<dyn UniverseSource>,
}

impl ScanService {
    pub fn new(scanner: Scanner, universe: Arc<dyn UniverseSource>) -> Self {
        Self { scanner, universe }
    }

    /// Runs a scan over `symbols`, or over the universe when no symbols
    /// (or an empty list) are given.
    pub async fn run(
        &self,
        symbols: Option<Vec<Symbol>>,
        request: &ScanRequest,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<ScanReport> {
        request.settings.validate().map_err(ScanError::InvalidRequest)?;

        let symbols = match symbols {
            Some(list) if !list.is_empty() => list,
            _ => {
                let universe = self.universe.fetch_universe().await.map_err(ScanError::Universe)?;
                tracing::info!(symbols = universe.len(), "Resolved symbols from the universe.");
                universe
            }
        };

        tracing::info!(
            symbols = symbols.len(),
            end_date = ?request.end_date,
            check_v2 = request.settings.check_v2,
            check_v3 = request.settings.check_v3,
            use_cached = request.settings.use_cached,
            "Scan requested."
        );

        Ok(self.scanner.scan(&symbols, request, cancel).await)
    }
}
