//! Bounded-concurrency batch scheduling.
//!
//! Candidates are split into consecutive batches of at most `concurrency`
//! members. A batch runs all of its handlers concurrently and completes only
//! once every one of them has settled; the next batch starts after a short
//! pause. Progress is reported after every settled handler, not per batch.

use crate::error::ScanError;
use crate::model::Candidate;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default number of probes in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Default pause between consecutive batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    concurrency: usize,
    batch_pause: Duration,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, DEFAULT_BATCH_PAUSE)
    }
}

impl BatchScheduler {
    /// A `concurrency` of zero is treated as one.
    pub fn new(concurrency: usize, batch_pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            batch_pause,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn batch_pause(&self) -> Duration {
        self.batch_pause
    }

    /// Runs `on_probe` once for every candidate, in input-order batches.
    ///
    /// Handler errors and panics are logged and counted as scanned; they never
    /// abort the batch or the run. `on_progress` receives the cumulative
    /// number of settled handlers, in completion order.
    ///
    /// Returns the final scanned count, always `candidates.len()`.
    pub async fn run<'a, H, Fut, P>(&self, candidates: &'a [Candidate], on_probe: H, mut on_progress: P) -> usize
    where
        H: Fn(&'a Candidate) -> Fut,
        Fut: Future<Output = Result<(), ScanError>> + 'a,
        P: FnMut(usize),
    {
        let mut scanned = 0;
        let batches = candidates.chunks(self.concurrency);
        let batch_count = batches.len();

        for (index, batch) in batches.enumerate() {
            debug!(batch = index + 1, of = batch_count, size = batch.len(), "starting batch");

            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .map(|candidate| {
                    let handler = AssertUnwindSafe(on_probe(candidate)).catch_unwind();
                    async move { (candidate, handler.await) }
                })
                .collect();

            while let Some((candidate, result)) = in_flight.next().await {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(id = %candidate.id, error = %e, "Detection error"),
                    Err(_) => {
                        let e = ScanError::HandlerPanicked {
                            id: candidate.id.clone(),
                        };
                        error!(id = %candidate.id, error = %e, "Detection error");
                    }
                }

                scanned += 1;
                on_progress(scanned);
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        scanned
    }
}
