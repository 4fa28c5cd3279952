// In crates/core-types/src/error.rs

use thiserror::Error;

/// The error kinds shared by every stage of the analysis pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The upstream payload could not be turned into a candle series.
    #[error("Invalid market data: {0}")]
    DataFormat(String),

    /// An invalid window, interval, date range or other parameter.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Transport or provider failure. Never cached.
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
