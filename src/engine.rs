//! Scan orchestration.
//!
//! A [`ScanEngine`] runs exactly one scan: it loads both datasets, probes
//! every candidate through the [`BatchScheduler`], and reports phases,
//! progress and detections to a [`ScanObserver`].
//!
//! ```text
//! Idle -> Loading -> Scanning -> Complete
//!            \
//!             -> Failed
//! ```
//!
//! Running consumes the engine, so a finished or failed scan cannot be
//! restarted; build a new engine instead.

use crate::aggregator::{Aggregator, ScanObserver};
use crate::dataset::{load_datasets, DatasetSource};
use crate::error::ScanError;
use crate::loader::ResourceLoader;
use crate::model::{Candidate, MetadataIndex, ScanPhase, ScanReport, DEFAULT_SCHEME};
use crate::probe::{Prober, DEFAULT_TIMEOUT};
use crate::scheduler::{BatchScheduler, DEFAULT_BATCH_PAUSE, DEFAULT_CONCURRENCY};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Tunables for a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub scheme: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub batch_pause: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

pub struct ScanEngine {
    prober: Prober,
    scheduler: BatchScheduler,
    phase: ScanPhase,
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("prober", &self.prober)
            .field("scheduler", &self.scheduler)
            .field("phase", &self.phase)
            .finish()
    }
}

impl ScanEngine {
    pub fn new(settings: ScanSettings, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            prober: Prober::new(loader)
                .with_scheme(settings.scheme)
                .with_timeout(settings.timeout),
            scheduler: BatchScheduler::new(settings.concurrency, settings.batch_pause),
            phase: ScanPhase::Idle,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    fn transition(&mut self, phase: ScanPhase, observer: &dyn ScanObserver) {
        info!(from = ?self.phase, to = ?phase, "scan phase");
        self.phase = phase;
        observer.on_phase(phase);
    }

    /// Loads both datasets and scans every candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::DatasetLoad`] if either dataset cannot be loaded.
    /// In that case no probe runs and the observer sees no progress or
    /// detection events, only the `Loading` and `Failed` phases.
    pub async fn run(
        mut self,
        candidates: &DatasetSource,
        metadata: &DatasetSource,
        observer: &dyn ScanObserver,
    ) -> Result<ScanReport, ScanError> {
        self.transition(ScanPhase::Loading, observer);

        let client = reqwest::Client::new();
        let (candidates, metadata) = match load_datasets(candidates, metadata, &client).await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "dataset load failed");
                self.transition(ScanPhase::Failed, observer);
                return Err(e.into());
            }
        };

        Ok(self.scan(candidates, metadata, observer).await)
    }

    /// Scans already-loaded datasets, starting from the `Scanning` phase.
    pub async fn scan(
        mut self,
        candidates: Vec<Candidate>,
        metadata: MetadataIndex,
        observer: &dyn ScanObserver,
    ) -> ScanReport {
        let scan_time = Utc::now();
        let started = Instant::now();
        let total = candidates.len();

        self.transition(ScanPhase::Scanning { total }, observer);

        let aggregator = Aggregator::new(total, metadata, observer);
        let prober = &self.prober;
        let aggregator_ref = &aggregator;

        self.scheduler
            .run(
                &candidates,
                |candidate| async move {
                    let detected = prober.probe(candidate).await;
                    aggregator_ref.record_outcome(candidate, detected)
                },
                |scanned| {
                    aggregator_ref.record_progress(scanned);
                },
            )
            .await;

        let (summary, detections) = aggregator.finish();
        self.transition(ScanPhase::Complete, observer);

        info!(
            scanned = summary.scanned,
            detected = summary.detected,
            total = summary.total,
            "scan complete"
        );

        ScanReport {
            scan_time,
            duration: started.elapsed(),
            summary,
            detections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::NullObserver;
    use crate::error::LoadError;
    use crate::model::ExtensionUrl;
    use async_trait::async_trait;

    /// Reports a fixed set of ids as installed.
    struct Installed(Vec<&'static str>);

    #[async_trait]
    impl ResourceLoader for Installed {
        fn name(&self) -> &'static str {
            "Installed"
        }

        async fn load_image(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
            self.check_exists(url).await
        }

        async fn check_exists(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
            if self.0.contains(&url.id.as_str()) {
                Ok(())
            } else {
                Err(LoadError::NotRegistered(url.id.clone()))
            }
        }
    }

    #[tokio::test]
    async fn test_scan_counts() {
        let engine = ScanEngine::new(ScanSettings::default(), Arc::new(Installed(vec!["a"])));
        assert_eq!(engine.phase(), ScanPhase::Idle);

        let report = engine
            .scan(
                vec![Candidate::new("a", "x.png"), Candidate::new("b", "y.json")],
                MetadataIndex::new(),
                &NullObserver,
            )
            .await;

        assert_eq!(report.summary.scanned, 2);
        assert_eq!(report.summary.detected, 1);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].candidate.id, "a");
    }

    /// Never settles for ids starting with `hung`, answers instantly otherwise.
    struct Stalling;

    #[async_trait]
    impl ResourceLoader for Stalling {
        fn name(&self) -> &'static str {
            "Stalling"
        }

        async fn load_image(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
            self.check_exists(url).await
        }

        async fn check_exists(&self, url: &ExtensionUrl) -> Result<(), LoadError> {
            if url.id.starts_with("hung") {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_loads_are_scanned_at_deadline() {
        let settings = ScanSettings {
            concurrency: 2,
            ..ScanSettings::default()
        };
        let engine = ScanEngine::new(settings, Arc::new(Stalling));
        let candidates = vec![
            Candidate::new("a", "x.png"),
            Candidate::new("hung1", "y.json"),
            Candidate::new("b", "z.json"),
            Candidate::new("hung2", "w.png"),
        ];

        let start = tokio::time::Instant::now();
        let report = engine
            .scan(candidates, MetadataIndex::new(), &NullObserver)
            .await;
        let elapsed = start.elapsed();

        assert_eq!(report.summary.scanned, 4);
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.detected, 2);
        let mut ids: Vec<_> = report
            .detections
            .iter()
            .map(|d| d.candidate.id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        // Two batches, each held open by a stalled load until the deadline.
        let expected = DEFAULT_TIMEOUT * 2 + DEFAULT_BATCH_PAUSE;
        assert!(elapsed >= expected, "elapsed {:?}", elapsed);
        assert!(elapsed < expected + Duration::from_millis(100), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_dataset() {
        let engine = ScanEngine::new(ScanSettings::default(), Arc::new(Installed(vec![])));

        let result = engine
            .run(
                &DatasetSource::from("/definitely/not/here/ids.json"),
                &DatasetSource::from("/definitely/not/here/meta.json"),
                &NullObserver,
            )
            .await;

        let err = result.unwrap_err();
        assert!(err.is_fatal());
    }
}
