//! Per-candidate existence probes.
//!
//! A [`Prober`] turns a [`Candidate`] into a detected/not-detected outcome:
//!
//! 1. [`ResourceKind::classify`] picks the strategy from the resource path.
//!    Images are loaded as images; everything else gets a body-less,
//!    uncached existence request.
//! 2. The load attempt and a deadline timer race on a shared [`SettleGate`].
//!    Whichever settles first decides the outcome, and the loser is aborted.
//!
//! A probe never fails: load errors, loader panics and timeouts all
//! resolve to `false`.
//!
//! The existence check counts any completed request as a detection, even
//! one answered with an error status. It only proves the extension's scheme
//! is registered, which is the signal being measured.

mod gate;

pub use gate::SettleGate;

use crate::loader::ResourceLoader;
use crate::model::{Candidate, DEFAULT_SCHEME};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Default wall-clock budget for a single probe.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp"];

/// How a resource is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Other,
}

impl ResourceKind {
    /// Classifies by file extension, case-insensitively.
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase();
        match lower.rsplit_once('.') {
            Some((_, ext)) if IMAGE_EXTENSIONS.contains(&ext) => ResourceKind::Image,
            _ => ResourceKind::Other,
        }
    }
}

/// Probes candidates through a [`ResourceLoader`] under a fixed deadline.
#[derive(Clone)]
pub struct Prober {
    loader: Arc<dyn ResourceLoader>,
    scheme: String,
    timeout: Duration,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("loader", &self.loader.name())
            .field("scheme", &self.scheme)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Prober {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes `candidate`, resolving within the configured timeout.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn probe(&self, candidate: &Candidate) -> bool {
        let url = candidate.url(&self.scheme);
        let kind = ResourceKind::classify(&candidate.path);
        let (gate, settled) = SettleGate::new();

        let timer = {
            let gate = gate.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if gate.finish(false) {
                    trace!("probe deadline elapsed");
                }
            })
        };

        let attempt = {
            let loader = Arc::clone(&self.loader);
            let url = url.clone();
            tokio::spawn(async move {
                let result = match kind {
                    ResourceKind::Image => loader.load_image(&url).await,
                    ResourceKind::Other => loader.check_exists(&url).await,
                };
                if let Err(e) = &result {
                    trace!(%url, error = %e, "load rejected");
                }
                gate.finish(result.is_ok());
            })
        };

        // Every sender lives in a task above; if both vanish without
        // settling, the probe counts as not detected.
        let outcome = settled.await.unwrap_or(false);
        timer.abort();
        attempt.abort();

        debug!(id = %candidate.id, %url, ?kind, detected = outcome, "probe settled");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::model::ExtensionUrl;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Records which strategy was used and answers from a fixed script.
    #[derive(Default)]
    struct ScriptedLoader {
        image_ok: bool,
        exists_ok: bool,
        delay: Option<Duration>,
        hang: bool,
        images: AtomicUsize,
        exists: AtomicUsize,
    }

    impl ScriptedLoader {
        async fn settle(&self, ok: bool) -> Result<(), LoadError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if ok {
                Ok(())
            } else {
                Err(LoadError::Status(404))
            }
        }
    }

    #[async_trait]
    impl ResourceLoader for ScriptedLoader {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn load_image(&self, _url: &ExtensionUrl) -> Result<(), LoadError> {
            self.images.fetch_add(1, Ordering::SeqCst);
            self.settle(self.image_ok).await
        }

        async fn check_exists(&self, _url: &ExtensionUrl) -> Result<(), LoadError> {
            self.exists.fetch_add(1, Ordering::SeqCst);
            self.settle(self.exists_ok).await
        }
    }

    struct PanickingLoader;

    #[async_trait]
    impl ResourceLoader for PanickingLoader {
        fn name(&self) -> &'static str {
            "Panicking"
        }

        async fn load_image(&self, _url: &ExtensionUrl) -> Result<(), LoadError> {
            panic!("decoder blew up");
        }

        async fn check_exists(&self, _url: &ExtensionUrl) -> Result<(), LoadError> {
            panic!("network stack blew up");
        }
    }

    #[test]
    fn test_classify_images() {
        for path in [
            "icon.png", "a/b/photo.JPG", "x.jpeg", "anim.gif", "pic.webp", "logo.SVG", "favicon.ico",
            "old.bmp",
        ] {
            assert_eq!(ResourceKind::classify(path), ResourceKind::Image, "{}", path);
        }
    }

    #[test]
    fn test_classify_other() {
        for path in ["manifest.json", "popup.html", "png", "img.png/readme", "x.png?v=2", "script.js"] {
            assert_eq!(ResourceKind::classify(path), ResourceKind::Other, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_image_path_uses_image_strategy() {
        let loader = Arc::new(ScriptedLoader {
            image_ok: true,
            ..Default::default()
        });
        let prober = Prober::new(loader.clone());

        assert!(prober.probe(&Candidate::new("a", "x.png")).await);
        assert_eq!(loader.images.load(Ordering::SeqCst), 1);
        assert_eq!(loader.exists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_path_uses_existence_check() {
        let loader = Arc::new(ScriptedLoader {
            exists_ok: false,
            image_ok: true,
            ..Default::default()
        });
        let prober = Prober::new(loader.clone());

        assert!(!prober.probe(&Candidate::new("b", "y.json")).await);
        assert_eq!(loader.images.load(Ordering::SeqCst), 0);
        assert_eq!(loader.exists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_load_resolves_false_at_deadline() {
        let loader = Arc::new(ScriptedLoader {
            exists_ok: true,
            hang: true,
            ..Default::default()
        });
        let prober = Prober::new(loader).with_timeout(Duration::from_millis(2500));

        let start = Instant::now();
        assert!(!prober.probe(&Candidate::new("slow", "data.json")).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2500));
        assert!(elapsed < Duration::from_millis(2600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_load_beats_deadline() {
        let loader = Arc::new(ScriptedLoader {
            image_ok: true,
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        });
        let prober = Prober::new(loader);

        let start = Instant::now();
        assert!(prober.probe(&Candidate::new("fast", "icon.png")).await);
        assert!(start.elapsed() < DEFAULT_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_is_ignored() {
        let loader = Arc::new(ScriptedLoader {
            image_ok: true,
            delay: Some(Duration::from_millis(3000)),
            ..Default::default()
        });
        let prober = Prober::new(loader);

        assert!(!prober.probe(&Candidate::new("late", "icon.png")).await);
    }

    #[tokio::test]
    async fn test_loader_panic_resolves_false() {
        let prober = Prober::new(Arc::new(PanickingLoader)).with_timeout(Duration::from_millis(200));

        assert!(!prober.probe(&Candidate::new("p", "icon.png")).await);
        assert!(!prober.probe(&Candidate::new("p", "data.json")).await);
    }
}
