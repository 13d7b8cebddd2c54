use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Run counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub batches_accepted: usize,
    pub batches_rejected: usize,
    pub samples_emitted: usize,
    pub samples_flagged: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_batch(&self, emitted: usize, flagged: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.batches_accepted += 1;
            metrics.samples_emitted += emitted;
            metrics.samples_flagged += flagged;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.batches_rejected += 1;
        }
    }

    /// Counts results emitted outside a batch, e.g. the end-of-run flush.
    pub fn record_flush(&self, emitted: usize, flagged: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.samples_emitted += emitted;
            metrics.samples_flagged += flagged;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }

    pub fn reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            *metrics = MetricsSnapshot::default();
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
