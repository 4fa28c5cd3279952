// In crates/scanner/src/error.rs

use core_types::Symbol;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    /// One symbol could not be scanned. Recorded in the report, never fatal.
    #[error("{symbol}: {source}")]
    PerSymbol {
        symbol: Symbol,
        source: core_types::Error,
    },
    #[error("Failed to resolve the symbol universe: {0}")]
    Universe(core_types::Error),
    #[error("Invalid scan request: {0}")]
    InvalidRequest(core_types::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
