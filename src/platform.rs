//! Cross-platform path resolution.
//!
//! This module finds the user data directories of Chromium-family browsers
//! and the per-profile `Extensions/` directories inside them.
//!
//! Lookups return `Option<PathBuf>` - returning `None` if the directory
//! doesn't exist or can't be determined.

use crate::model::{Browser, Platform};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXTENSIONS_DIR: &str = "Extensions";

/// Returns the user data directory of `browser` on the current platform.
///
/// Platform-specific locations, e.g. for Chrome:
/// - Linux: `~/.config/google-chrome/`
/// - macOS: `~/Library/Application Support/Google/Chrome/`
/// - Windows: `%LOCALAPPDATA%\Google\Chrome\User Data\`
///
/// Arc is only available on macOS. Opera keeps its single profile directly
/// in the returned directory.
///
/// Returns `None` if the directory doesn't exist.
pub fn browser_user_data_dir(browser: Browser) -> Option<PathBuf> {
    let path = match Platform::current() {
        Platform::Linux => {
            let config = dirs::config_dir()?;
            match browser {
                Browser::Chrome => config.join("google-chrome"),
                Browser::Chromium => config.join("chromium"),
                Browser::Edge => config.join("microsoft-edge"),
                Browser::Brave => config.join("BraveSoftware").join("Brave-Browser"),
                Browser::Vivaldi => config.join("vivaldi"),
                Browser::Opera => config.join("opera"),
                Browser::Arc => return None,
            }
        }
        Platform::MacOS => {
            let support = dirs::home_dir()?.join("Library").join("Application Support");
            match browser {
                Browser::Chrome => support.join("Google").join("Chrome"),
                Browser::Chromium => support.join("Chromium"),
                Browser::Edge => support.join("Microsoft Edge"),
                Browser::Brave => support.join("BraveSoftware").join("Brave-Browser"),
                Browser::Vivaldi => support.join("Vivaldi"),
                Browser::Opera => support.join("com.operasoftware.Opera"),
                Browser::Arc => support.join("Arc").join("User Data"),
            }
        }
        Platform::Windows => {
            let local = dirs::data_local_dir()?;
            match browser {
                Browser::Chrome => local.join("Google").join("Chrome").join("User Data"),
                Browser::Chromium => local.join("Chromium").join("User Data"),
                Browser::Edge => local.join("Microsoft").join("Edge").join("User Data"),
                Browser::Brave => local
                    .join("BraveSoftware")
                    .join("Brave-Browser")
                    .join("User Data"),
                Browser::Vivaldi => local.join("Vivaldi").join("User Data"),
                Browser::Opera => dirs::data_dir()?
                    .join("Opera Software")
                    .join("Opera Stable"),
                Browser::Arc => return None,
            }
        }
    };

    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Finds `Extensions/` directories under `root`.
///
/// `root` may be an `Extensions/` directory itself, a single profile
/// (`Default/`, `Profile 1/`) or a whole user data directory. Results are
/// sorted so lookups across profiles are deterministic.
pub fn find_extension_dirs(root: &Path) -> Vec<PathBuf> {
    if root.file_name().map(|n| n == EXTENSIONS_DIR).unwrap_or(false) && root.is_dir() {
        return vec![root.to_path_buf()];
    }

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == EXTENSIONS_DIR)
        .map(|e| e.into_path())
        .collect();

    found.sort();
    found
}
