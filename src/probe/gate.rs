use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// A one-shot resolution cell shared by every path that can settle a probe.
///
/// The first [`finish`](SettleGate::finish) delivers its outcome to the
/// receiver returned by [`SettleGate::new`]; every later call is a no-op.
#[derive(Debug, Clone)]
pub struct SettleGate {
    sender: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl SettleGate {
    pub fn new() -> (Self, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        let gate = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (gate, rx)
    }

    /// Settles the gate with `outcome`. Returns `true` if this call won.
    pub fn finish(&self, outcome: bool) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(tx) => {
                // The receiver may already be gone; the gate is settled either way.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
