//! Loading of the candidate list and the metadata dataset.
//!
//! Each dataset is a single JSON document read from a local path or fetched
//! from an `http(s)://` URL. Both are loaded concurrently before a scan
//! starts; if either fails the scan never begins.

use crate::error::DatasetError;
use crate::model::{Candidate, MetadataIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Where a dataset document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, DatasetSource::Url(_))
    }
}

impl From<String> for DatasetSource {
    fn from(s: String) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DatasetSource::Url(s)
        } else {
            DatasetSource::Path(PathBuf::from(s))
        }
    }
}

impl From<&str> for DatasetSource {
    fn from(s: &str) -> Self {
        DatasetSource::from(s.to_string())
    }
}

impl From<DatasetSource> for String {
    fn from(source: DatasetSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Url(url) => write!(f, "{}", url),
            DatasetSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads and decodes one JSON document.
///
/// # Errors
///
/// Returns an error on I/O or transport failure, a non-success HTTP status,
/// or a document that does not decode as `T`.
pub async fn load_json<T: DeserializeOwned>(
    source: &DatasetSource,
    client: &reqwest::Client,
) -> Result<T, DatasetError> {
    let source_name = source.to_string();
    debug!(source = %source_name, "loading dataset");

    let bytes = match source {
        DatasetSource::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|error| DatasetError::Http {
                    source_name: source_name.clone(),
                    error,
                })?;

            if !response.status().is_success() {
                return Err(DatasetError::Status {
                    source_name,
                    status: response.status().as_u16(),
                });
            }

            response
                .bytes()
                .await
                .map_err(|error| DatasetError::Http {
                    source_name: source_name.clone(),
                    error,
                })?
                .to_vec()
        }
        DatasetSource::Path(path) => tokio::fs::read(path).await.map_err(|error| DatasetError::Io {
            source_name: source_name.clone(),
            error,
        })?,
    };

    serde_json::from_slice(&bytes).map_err(|error| DatasetError::Parse { source_name, error })
}

/// Loads the candidate list and the metadata index concurrently.
pub async fn load_datasets(
    candidates: &DatasetSource,
    metadata: &DatasetSource,
    client: &reqwest::Client,
) -> Result<(Vec<Candidate>, MetadataIndex), DatasetError> {
    tokio::try_join!(
        load_json::<Vec<Candidate>>(candidates, client),
        load_json::<MetadataIndex>(metadata, client),
    )
}
