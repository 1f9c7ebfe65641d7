use super::{Candidate, MetadataRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Lifecycle of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "phase")]
pub enum ScanPhase {
    Idle,
    Loading,
    Scanning { total: usize },
    Complete,
    Failed,
}

impl ScanPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Complete | ScanPhase::Failed)
    }
}

/// Cumulative counters for one scan.
///
/// Both counters only ever move forward. `scanned` is driven by the
/// scheduler, `detected` by positive probe outcomes.
#[derive(Debug)]
pub struct ScanState {
    total: usize,
    scanned: AtomicUsize,
    detected: AtomicUsize,
}

impl ScanState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            scanned: AtomicUsize::new(0),
            detected: AtomicUsize::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn scanned(&self) -> usize {
        self.scanned.load(Ordering::SeqCst)
    }

    pub fn detected(&self) -> usize {
        self.detected.load(Ordering::SeqCst)
    }

    /// Raises the scanned count to `scanned`, capped at `total`.
    pub(crate) fn advance_scanned(&self, scanned: usize) -> usize {
        let capped = scanned.min(self.total);
        self.scanned.fetch_max(capped, Ordering::SeqCst);
        self.scanned()
    }

    pub(crate) fn increment_detected(&self) -> usize {
        self.detected.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            scanned: self.scanned(),
            detected: self.detected(),
            total: self.total,
        }
    }
}

/// Progress tuple forwarded to the status boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub scanned: usize,
    pub detected: usize,
    pub total: usize,
}

impl ProgressUpdate {
    /// Rounded completion percentage, clamped to 100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.scanned as f64 / self.total as f64 * 100.0).round();
        pct.min(100.0) as u8
    }
}

/// A positive probe result, paired with whatever the dataset knows about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub candidate: Candidate,
    pub metadata: Option<MetadataRecord>,
}

impl Detection {
    pub fn is_listed(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.display_name.as_ref())
            .is_some()
    }
}

/// Final result of a completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub summary: ProgressUpdate,
    pub detections: Vec<Detection>,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let p = |scanned, total| ProgressUpdate {
            scanned,
            detected: 0,
            total,
        };
        assert_eq!(p(0, 0).percent(), 0);
        assert_eq!(p(1, 3).percent(), 33);
        assert_eq!(p(2, 3).percent(), 67);
        assert_eq!(p(3, 3).percent(), 100);
        assert_eq!(p(5, 3).percent(), 100);
    }

    #[test]
    fn test_scanned_never_exceeds_total_or_regresses() {
        let state = ScanState::new(2);
        assert_eq!(state.advance_scanned(1), 1);
        assert_eq!(state.advance_scanned(5), 2);
        assert_eq!(state.advance_scanned(1), 2);
    }

    #[test]
    fn test_is_listed() {
        let mut detection = Detection {
            candidate: Candidate::new("a", "x.png"),
            metadata: None,
        };
        assert!(!detection.is_listed());

        detection.metadata = Some(MetadataRecord {
            display_name: Some("Thing".to_string()),
            ..Default::default()
        });
        assert!(detection.is_listed());
    }
}
