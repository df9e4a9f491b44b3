//! Error types for Blocklister.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the ingestion core.
#[derive(Error, Debug)]
pub enum BlocklisterError {
    /// The requested list is not in the registry.
    #[error("Unsupported list: {0}")]
    UnknownSource(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The source was parsed but produced zero ranges.
    #[error("No data for list: {0}")]
    EmptyResult(String),

    /// Download failed and there is no previous snapshot to fall back on.
    #[error("No cached copy of {source_id} at {path:?}")]
    CacheUnavailable { source_id: String, path: PathBuf },

    #[error("File system error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

/// A single failed download attempt. Never fatal beyond that attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timeout fetching {url}")]
    Timeout { url: String },

    #[error("failed to decompress {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response from {url} too large: {size} bytes (max: {max} bytes)")]
    TooLarge { url: String, size: usize, max: usize },

    #[error("failed to write cache file {path:?}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    /// Map a reqwest error to the timeout or network variant.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

pub type Result<T, E = BlocklisterError> = std::result::Result<T, E>;
