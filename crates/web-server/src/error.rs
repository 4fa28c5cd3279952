// In crates/web-server/src/error.rs

use axum::http::StatusCode;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use scanner::ScanError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed request parameters.
    #[error("{0}")]
    BadRequest(String),
    /// The market-data supplier failed or sent something unusable.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
    #[error("Failed to bind the server: {0}")]
    ServerBindError(std::io::Error),
    #[error("Server error: {0}")]
    ServeError(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::Internal(_) | Error::ServerBindError(_) | Error::ServeError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed.");
        } else {
            tracing::warn!(error = %self, "Rejected request.");
        }
        (status, axum::Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<core_types::Error> for Error {
    fn from(e: core_types::Error) -> Self {
        match e {
            core_types::Error::Configuration(_) => Error::BadRequest(e.to_string()),
            core_types::Error::UpstreamFetch(_) | core_types::Error::DataFormat(_) => Error::Upstream(e.to_string()),
        }
    }
}

impl From<ScanError> for Error {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::InvalidRequest(_) => Error::BadRequest(e.to_string()),
            ScanError::Universe(_) => Error::Upstream(e.to_string()),
            _ => Error::Internal(e.to_string()),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(e: QueryRejection) -> Self {
        Error::BadRequest(e.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(e: JsonRejection) -> Self {
        Error::BadRequest(e.body_text())
    }
}
