use serde::{Deserialize, Serialize};
use std::fmt;

/// URL scheme Chromium-family browsers use for extension resources.
pub const DEFAULT_SCHEME: &str = "chrome-extension";

/// An extension to probe for: its store identifier and a resource path that
/// is only retrievable when the extension is installed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub path: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Builds the internal URL for this candidate under `scheme`.
    pub fn url(&self, scheme: &str) -> ExtensionUrl {
        ExtensionUrl {
            scheme: scheme.to_string(),
            id: self.id.clone(),
            path: self.path.trim_start_matches('/').to_string(),
        }
    }
}

/// `<scheme>://<id>/<path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionUrl {
    pub scheme: String,
    pub id: String,
    pub path: String,
}

impl fmt::Display for ExtensionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.id, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_format() {
        let candidate = Candidate::new("abcdef", "icons/icon48.png");
        assert_eq!(
            candidate.url(DEFAULT_SCHEME).to_string(),
            "chrome-extension://abcdef/icons/icon48.png"
        );
    }

    #[test]
    fn test_url_strips_leading_slash() {
        let candidate = Candidate::new("abcdef", "/popup.html");
        assert_eq!(candidate.url("moz-extension").to_string(), "moz-extension://abcdef/popup.html");
    }

    #[test]
    fn test_candidate_deserialize() {
        let json = r#"[{"id": "a", "path": "x.png"}, {"id": "b", "path": "y.json"}]"#;
        let candidates: Vec<Candidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1], Candidate::new("b", "y.json"));
    }
}
