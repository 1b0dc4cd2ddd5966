//! Assessment telemetry collector and helpers.
//!
//! The collector multiplexes session lifecycle and rejected-sample events
//! into a bounded history plus an async broadcast stream. It only observes:
//! no assessment state is ever read back from it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub mod events;

pub use events::{AssessmentEvent, FinalizeTrigger};

/// Global telemetry collector shared across the crate.
static HUB: Lazy<Arc<TelemetryCollector>> = Lazy::new(|| Arc::new(TelemetryCollector::default()));

/// Access the global telemetry collector.
pub fn hub() -> Arc<TelemetryCollector> {
    Arc::clone(&HUB)
}

/// Snapshot of collector state, written by `screening_cli --telemetry`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<AssessmentEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<AssessmentEvent>,
    history: Mutex<VecDeque<AssessmentEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        let history_capacity = history_capacity.max(1);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<AssessmentEvent>> {
        match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn publish(&self, event: AssessmentEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history();
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssessmentEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history();
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }

    /// Events recorded for one session, oldest first
    pub fn session_events(&self, session_id: u64) -> Vec<AssessmentEvent> {
        self.history()
            .iter()
            .filter(|event| event.session_id() == session_id)
            .cloned()
            .collect()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}
