//! Result aggregation and the rendering boundary.

use crate::error::ScanError;
use crate::model::{Candidate, Detection, MetadataIndex, ProgressUpdate, ScanPhase, ScanState};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Receives scan events for presentation.
///
/// Detections arrive in completion order, which depends on probe timing,
/// so observers must treat them as an unordered, append-only stream.
/// All methods default to doing nothing.
pub trait ScanObserver: Send + Sync {
    fn on_phase(&self, _phase: ScanPhase) {}

    fn on_progress(&self, _update: ProgressUpdate) {}

    fn on_detection(&self, _detection: &Detection) {}
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Tracks scan counters and forwards events to a [`ScanObserver`].
pub struct Aggregator<'a> {
    state: ScanState,
    metadata: MetadataIndex,
    observer: &'a dyn ScanObserver,
    detections: Mutex<Vec<Detection>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(total: usize, metadata: MetadataIndex, observer: &'a dyn ScanObserver) -> Self {
        Self {
            state: ScanState::new(total),
            metadata,
            observer,
            detections: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Records one probe outcome.
    ///
    /// Positive outcomes are counted before the metadata lookup, so a
    /// malformed record still shows up in the detected total even though no
    /// detection is emitted for it.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Metadata`] when the candidate's metadata entry
    /// exists but cannot be decoded.
    pub fn record_outcome(&self, candidate: &Candidate, detected: bool) -> Result<(), ScanError> {
        if !detected {
            return Ok(());
        }

        self.state.increment_detected();
        let metadata = self
            .metadata
            .lookup(&candidate.id)
            .map_err(|source| ScanError::Metadata {
                id: candidate.id.clone(),
                source,
            })?;

        let detection = Detection {
            candidate: candidate.clone(),
            metadata,
        };
        info!(
            id = %candidate.id,
            name = detection.metadata.as_ref().and_then(|m| m.display_name.as_deref()).unwrap_or("unknown"),
            "extension detected"
        );

        self.observer.on_detection(&detection);
        self.detections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(detection);
        Ok(())
    }

    /// Advances the scanned counter and publishes the new totals.
    pub fn record_progress(&self, scanned: usize) -> ProgressUpdate {
        self.state.advance_scanned(scanned);
        let update = self.state.snapshot();
        self.observer.on_progress(update);
        update
    }

    /// Consumes the aggregator, returning final totals and every detection
    /// in emission order.
    pub fn finish(self) -> (ProgressUpdate, Vec<Detection>) {
        let summary = self.state.snapshot();
        let detections = self
            .detections
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (summary, detections)
    }
}
