//! Configuration file handling.
//!
//! This module provides loading and saving of extprobe configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/extprobe/config.toml`
//! - macOS: `~/Library/Application Support/extprobe/config.toml`
//! - Windows: `%APPDATA%\extprobe\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! timeout_ms = 2500
//! concurrency = 12
//! batch_pause_ms = 80
//! scheme = "chrome-extension"
//! candidates = "https://example.com/extension_ids.json"
//! metadata = "extensions_metadata.json"
//! default_format = "table"
//!
//! [loader]
//! kind = "profile"
//! browser = "chrome"
//! ```

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::dataset::DatasetSource;
use crate::engine::ScanSettings;
use crate::loader::LoaderKind;
use crate::model::{Browser, DEFAULT_SCHEME};
use crate::probe::DEFAULT_TIMEOUT;
use crate::scheduler::{DEFAULT_BATCH_PAUSE, DEFAULT_CONCURRENCY};

/// Application configuration.
///
/// Every field has a default, so a partial file (or none at all) is valid.
/// Command-line flags override values loaded from here.
///
/// # Example
///
/// ```no_run
/// use extprobe::Config;
///
/// let config = Config::load().unwrap();
///
/// println!("Probe timeout: {} ms", config.timeout_ms);
/// println!("Concurrency: {}", config.concurrency);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-probe deadline in milliseconds.
    ///
    /// Default: 2500
    pub timeout_ms: u64,

    /// Maximum number of probes in flight (the batch size).
    ///
    /// Default: 12
    pub concurrency: usize,

    /// Pause between batches in milliseconds.
    ///
    /// Default: 80
    pub batch_pause_ms: u64,

    /// URL scheme of extension resources.
    ///
    /// Default: "chrome-extension"
    pub scheme: String,

    /// Candidate list: a local path or an http(s) URL.
    ///
    /// Default: "extension_ids.json"
    pub candidates: String,

    /// Metadata dataset: a local path or an http(s) URL.
    ///
    /// Default: "extensions_metadata.json"
    pub metadata: String,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json", "html"
    /// Default: "table"
    pub default_format: String,

    /// Which loader answers probes.
    pub loader: LoaderConfig,
}

/// Settings for the resource loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// "profile" (default) or "http".
    pub kind: LoaderKind,

    /// Explicit profile, user data or `Extensions/` directory.
    ///
    /// Takes precedence over `browser`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,

    /// Browser whose default user data directory is scanned.
    ///
    /// Default: chrome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<Browser>,

    /// Origin for the HTTP loader, e.g. `http://127.0.0.1:8787/ext`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            concurrency: DEFAULT_CONCURRENCY,
            batch_pause_ms: DEFAULT_BATCH_PAUSE.as_millis() as u64,
            scheme: DEFAULT_SCHEME.to_string(),
            candidates: "extension_ids.json".to_string(),
            metadata: "extensions_metadata.json".to_string(),
            default_format: "table".to_string(),
            loader: LoaderConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make a scan meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }
        if self.scheme.is_empty() || self.scheme.contains(':') {
            bail!("scheme must be a bare URL scheme such as \"chrome-extension\"");
        }
        if self.loader.kind == LoaderKind::Http && self.loader.base_url.is_none() {
            bail!("loader.base_url is required when loader.kind = \"http\"");
        }
        Ok(())
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("extprobe")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            scheme: self.scheme.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            concurrency: self.concurrency,
            batch_pause: Duration::from_millis(self.batch_pause_ms),
        }
    }

    pub fn candidates_source(&self) -> DatasetSource {
        DatasetSource::from(self.candidates.as_str())
    }

    pub fn metadata_source(&self) -> DatasetSource {
        DatasetSource::from(self.metadata.as_str())
    }
}
