use super::{looks_like_image, ResourceLoader};
use crate::error::LoadError;
use crate::model::{Browser, ExtensionUrl};
use crate::platform::{browser_user_data_dir, find_extension_dirs};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Resolves extension URLs against Chromium profile `Extensions/` directories.
///
/// Installed extensions live at `Extensions/<id>/<version>/`. The scheme for
/// an id counts as registered as soon as `Extensions/<id>` exists in any of
/// the configured directories; resources are served from the newest version
/// and only when the manifest lists them as web accessible.
#[derive(Debug, Clone)]
pub struct ProfileLoader {
    extension_dirs: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct ExtensionManifest {
    #[serde(default)]
    web_accessible_resources: Vec<WebAccessibleEntry>,
}

/// Manifest V2 lists bare patterns, V3 groups them with match rules.
#[derive(Deserialize)]
#[serde(untagged)]
enum WebAccessibleEntry {
    Pattern(String),
    Group {
        #[serde(default)]
        resources: Vec<String>,
    },
}

impl ProfileLoader {
    pub fn new(extension_dirs: Vec<PathBuf>) -> Self {
        Self { extension_dirs }
    }

    /// Builds a loader from a user data directory, a single profile or an
    /// `Extensions/` directory.
    pub fn discover(root: &Path) -> Self {
        Self::new(find_extension_dirs(root))
    }

    /// Builds a loader over every profile of `browser` on this machine.
    ///
    /// Returns `None` when the browser has no user data directory here.
    pub fn for_browser(browser: Browser) -> Option<Self> {
        let root = browser_user_data_dir(browser)?;
        Some(Self::discover(&root))
    }

    pub fn extension_dirs(&self) -> &[PathBuf] {
        &self.extension_dirs
    }

    async fn registered_dir(&self, id: &str) -> Result<PathBuf, LoadError> {
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Err(LoadError::NotRegistered(id.to_string()));
        }

        for dir in &self.extension_dirs {
            let candidate = dir.join(id);
            if is_dir(&candidate).await {
                return Ok(candidate);
            }
        }

        Err(LoadError::NotRegistered(id.to_string()))
    }

    /// Picks the newest installed version directory.
    async fn latest_version_dir(&self, ext_dir: &Path) -> Result<PathBuf, LoadError> {
        let mut entries = fs::read_dir(ext_dir).await?;
        let mut latest: Option<(VersionKey, PathBuf)> = None;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_dir(&path).await {
                continue;
            }
            let key = version_key(&entry.file_name().to_string_lossy());
            if latest.as_ref().map(|(k, _)| key > *k).unwrap_or(true) {
                latest = Some((key, path));
            }
        }

        latest
            .map(|(_, path)| path)
            .ok_or_else(|| LoadError::Missing(ext_dir.display().to_string()))
    }

    async fn web_accessible_patterns(&self, version_dir: &Path) -> Result<Vec<String>, LoadError> {
        let manifest_path = version_dir.join("manifest.json");
        let content = match fs::read_to_string(&manifest_path).await {
            Ok(c) => c,
            Err(_) => return Err(LoadError::Missing(manifest_path.display().to_string())),
        };

        let manifest: ExtensionManifest = serde_json::from_str(&content)
            .map_err(|_| LoadError::Missing(manifest_path.display().to_string()))?;

        Ok(manifest
            .web_accessible_resources
            .into_iter()
            .flat_map(|entry| match entry {
                WebAccessibleEntry::Pattern(p) => vec![p],
                WebAccessibleEntry::Group { resources } => resources,
            })
            .collect())
    }

    /// Resolves `url` to the on-disk file the browser would serve, checking
    /// registration and web accessibility but not that the file exists.
    async fn resolve(&self, url: &ExtensionUrl) -> Result<PathBuf, LoadError> {
        let ext_dir = self.registered_dir(&url.id).await?;
        let version_dir = self.latest_version_dir(&ext_dir).await?;

        let relative = Path::new(&url.path);
        if url.path.is_empty() || relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(LoadError::Missing(url.to_string()));
        }

        let patterns = self.web_accessible_patterns(&version_dir).await?;
        if !is_web_accessible(&patterns, &url.path) {
            return Err(LoadError::Missing(url.to_string()));
        }

        Ok(version_dir.join(relative))
    }
}

#[async_trait]
impl ResourceLoader for ProfileLoader {
    fn name(&self) -> &'static str {
        "Browser Profile"
    }

    async fn load_image(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
        let path = self.resolve(url).await?;

        let bytes = match fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::Missing(url.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if looks_like_image(&bytes) {
            Ok(())
        } else {
            Err(LoadError::NotAnImage(url.to_string()))
        }
    }

    async fn check_exists(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
        // A listed resource that is missing on disk still completes the
        // request, only with a failing status.
        self.resolve(url).await.map(|_| ())
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

type VersionKey = (Vec<u64>, String);

/// Orders version directories like `1.10.2_0` numerically.
fn version_key(name: &str) -> VersionKey {
    let version = name.split_once('_').map(|(v, _)| v).unwrap_or(name);
    let parts = version
        .split('.')
        .map(|p| p.parse::<u64>().unwrap_or(0))
        .collect();
    (parts, name.to_string())
}

fn is_web_accessible(patterns: &[String], path: &str) -> bool {
    patterns
        .iter()
        .map(|p| p.trim_start_matches('/'))
        .any(|pattern| glob_match(pattern, path))
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, DEFAULT_SCHEME};
    use std::fs as stdfs;
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

    fn install(root: &Path, id: &str, version: &str, manifest: &str, files: &[(&str, &[u8])]) {
        let dir = root.join(id).join(version);
        stdfs::create_dir_all(&dir).unwrap();
        stdfs::write(dir.join("manifest.json"), manifest).unwrap();
        for (name, bytes) in files {
            let path = dir.join(name);
            stdfs::create_dir_all(path.parent().unwrap()).unwrap();
            stdfs::write(path, bytes).unwrap();
        }
    }

    fn url(id: &str, path: &str) -> ExtensionUrl {
        Candidate::new(id, path).url(DEFAULT_SCHEME)
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("images/*", "images/icon.png"));
        assert!(glob_match("*.png", "icons/16.png"));
        assert!(glob_match("*", "anything.js"));
        assert!(glob_match("popup.html", "popup.html"));
        assert!(!glob_match("images/*", "scripts/app.js"));
        assert!(!glob_match("*.png", "icon.svg"));
    }

    #[test]
    fn test_version_key_orders_numerically() {
        assert!(version_key("1.10.0_0") > version_key("1.9.3_0"));
        assert!(version_key("2.0_1") > version_key("2.0_0"));
    }

    #[tokio::test]
    async fn test_load_image_from_latest_version() {
        let tmp = TempDir::new().unwrap();
        let manifest_v3 = r#"{"manifest_version": 3, "web_accessible_resources": [{"resources": ["icons/*"], "matches": ["<all_urls>"]}]}"#;
        install(tmp.path(), "abc", "1.9.0_0", manifest_v3, &[]);
        install(tmp.path(), "abc", "1.10.0_0", manifest_v3, &[("icons/48.png", PNG)]);

        let loader = ProfileLoader::new(vec![tmp.path().to_path_buf()]);
        assert!(loader.load_image(&url("abc", "icons/48.png")).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_image_rejects_unlisted_and_non_image() {
        let tmp = TempDir::new().unwrap();
        let manifest_v2 = r#"{"manifest_version": 2, "web_accessible_resources": ["img/*.png", "data.png"]}"#;
        install(
            tmp.path(),
            "abc",
            "1.0_0",
            manifest_v2,
            &[("img/a.png", PNG), ("hidden.png", PNG), ("data.png", b"{}")],
        );

        let loader = ProfileLoader::new(vec![tmp.path().to_path_buf()]);
        assert!(loader.load_image(&url("abc", "img/a.png")).await.is_ok());
        assert!(matches!(
            loader.load_image(&url("abc", "hidden.png")).await,
            Err(LoadError::Missing(_))
        ));
        assert!(matches!(
            loader.load_image(&url("abc", "data.png")).await,
            Err(LoadError::NotAnImage(_))
        ));
        assert!(matches!(
            loader.load_image(&url("abc", "img/../hidden.png")).await,
            Err(LoadError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_check_exists_ignores_missing_file() {
        let tmp = TempDir::new().unwrap();
        let manifest = r#"{"web_accessible_resources": ["*.json"]}"#;
        install(tmp.path(), "abc", "3.0_0", manifest, &[]);

        let loader = ProfileLoader::new(vec![tmp.path().to_path_buf()]);
        assert!(loader.check_exists(&url("abc", "config.json")).await.is_ok());
        assert!(loader.check_exists(&url("abc", "script.js")).await.is_err());
    }

    #[tokio::test]
    async fn test_unregistered_extension() {
        let tmp = TempDir::new().unwrap();
        let loader = ProfileLoader::new(vec![tmp.path().to_path_buf()]);

        assert!(matches!(
            loader.check_exists(&url("nope", "x.json")).await,
            Err(LoadError::NotRegistered(_))
        ));
        assert!(matches!(
            loader.load_image(&url("../etc", "x.png")).await,
            Err(LoadError::NotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_searches_every_profile() {
        let tmp = TempDir::new().unwrap();
        let default = tmp.path().join("Default").join("Extensions");
        let second = tmp.path().join("Profile 1").join("Extensions");
        stdfs::create_dir_all(&default).unwrap();
        install(&second, "xyz", "1.0_0", r#"{"web_accessible_resources": ["*"]}"#, &[("logo.svg", b"<svg/>")]);

        let loader = ProfileLoader::discover(tmp.path());
        assert_eq!(loader.extension_dirs().len(), 2);
        assert!(loader.load_image(&url("xyz", "logo.svg")).await.is_ok());
    }
}
