//! Resource loaders.
//!
//! A [`ResourceLoader`] stands in for the browser: it answers whether an
//! extension-internal URL can be loaded, through the two signals a probe
//! relies on.
//!
//! | Loader | Backing | Registered when |
//! |--------|---------|-----------------|
//! | [`ProfileLoader`] | Chromium profile `Extensions/` directories | `Extensions/<id>` exists |
//! | [`HttpLoader`] | `<base>/<id>/<path>` over HTTP | the request completes |

mod http;
mod profile;

pub use http::HttpLoader;
pub use profile::ProfileLoader;

use crate::error::LoadError;
use crate::model::ExtensionUrl;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Loads extension-internal resources.
///
/// Both methods report success as `Ok(())`. Any `Err` is treated by the
/// probe as "not detected", so implementors should not retry.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Returns the human-readable name of this loader.
    fn name(&self) -> &'static str;

    /// Loads the resource as an image. Succeeds only when the resource is
    /// reachable and decodes as an image.
    async fn load_image(&self, url: &ExtensionUrl) -> Result<(), LoadError>;

    /// Issues a body-less, uncached existence request. Succeeds whenever the
    /// request is allowed to complete, whatever the response says.
    async fn check_exists(&self, url: &ExtensionUrl) -> Result<(), LoadError>;
}

/// Which [`ResourceLoader`] a scan uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    #[default]
    Profile,
    Http,
}

impl std::str::FromStr for LoaderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "profile" => Ok(LoaderKind::Profile),
            "http" => Ok(LoaderKind::Http),
            _ => Err(format!("Unknown loader: {}. Use 'profile' or 'http'", s)),
        }
    }
}

/// Sniffs the leading bytes of a resource for a known image format.
pub(crate) fn looks_like_image(bytes: &[u8]) -> bool {
    const SIGNATURES: &[&[u8]] = &[
        b"\x89PNG\r\n\x1a\n",
        b"\xff\xd8\xff",
        b"GIF87a",
        b"GIF89a",
        b"BM",
        b"\x00\x00\x01\x00",
    ];

    if SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
        return true;
    }

    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return true;
    }

    // SVG is text; look for the root element near the start.
    let head = &bytes[..bytes.len().min(1024)];
    String::from_utf8_lossy(head).to_lowercase().contains("<svg")
}
