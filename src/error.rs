//! Error types for dataset loading, resource loads and scan handling.

use thiserror::Error;

/// Failure to load one of the input datasets. Fatal to the scan.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Unable to read dataset {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Unable to fetch dataset {source_name}: {error}")]
    Http {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("Unable to load dataset from {source_name}: {status}")]
    Status { source_name: String, status: u16 },

    #[error("Dataset {source_name} is not valid JSON: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
}

/// Rejection of a single resource load. Never leaves the probe.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no extension registered for {0}")]
    NotRegistered(String),

    #[error("resource not found: {0}")]
    Missing(String),

    #[error("resource is not a decodable image: {0}")]
    NotAnImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by a scan.
///
/// Only [`ScanError::DatasetLoad`] ends a scan; the others are raised while
/// handling one candidate and are logged and counted by the scheduler.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unable to complete scan: {0}")]
    DatasetLoad(#[from] DatasetError),

    #[error("Malformed metadata for {id}: {source}")]
    Metadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Detection handler panicked for {id}")]
    HandlerPanicked { id: String },
}

impl ScanError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::DatasetLoad(_))
    }
}
