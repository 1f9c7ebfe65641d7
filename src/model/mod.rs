//! Core data types for candidates, metadata and scan results.
//!
//! - [`Candidate`] - An extension identifier plus a probe-able resource path
//! - [`MetadataIndex`] / [`MetadataRecord`] - Reference data for known extensions
//! - [`ScanState`] / [`ProgressUpdate`] - Running counters for a scan
//! - [`Detection`] - A positive match forwarded to the renderer
//! - [`ScanReport`] - Complete scan results
//! - [`Browser`] / [`Platform`] - Where local profiles live
//!
//! # Example
//!
//! ```
//! use extprobe::model::{Candidate, DEFAULT_SCHEME};
//!
//! let candidate = Candidate::new("nkbihfbeogaeaoehlefnkodbefgpgknn", "images/icon-64.png");
//! assert!(candidate.url(DEFAULT_SCHEME).to_string().starts_with("chrome-extension://"));
//! ```

mod browser;
mod candidate;
mod metadata;
mod scan;

pub use browser::*;
pub use candidate::*;
pub use metadata::*;
pub use scan::*;
