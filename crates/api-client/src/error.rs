// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that goes wrong talking to the supplier is an upstream
/// failure as far as the analysis core is concerned.
impl From<Error> for core_types::Error {
    fn from(e: Error) -> Self {
        core_types::Error::UpstreamFetch(e.to_string())
    }
}
