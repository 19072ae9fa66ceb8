//! Error types for the file cache
//!
//! Provides unified error handling using thiserror.
//!
//! Decode failures never show up here: an unreadable or corrupt shard file is
//! a cache miss. Only structural failures are reported.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the file cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A shard file (or its directory) could not be written
    #[error("failed to write cache file {path}: {source}")]
    Write {
        /// The shard file that was being written
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The configured root does not resolve to a usable directory
    #[error("invalid cache root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A value or shard mapping could not be encoded
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// `end_cache` was called without a preceding miss-path `start_cache`
    #[error("no active fragment capture")]
    NoActiveCapture,

    /// `start_cache` was called while another capture is still open
    #[error("a fragment capture is already active")]
    CaptureActive,

    /// Fragment output could not be written to the caller's sink
    #[error("failed to emit fragment output: {0}")]
    Output(#[source] std::io::Error),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            CacheError::NotFound(msg) | CacheError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse::new(message));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;
