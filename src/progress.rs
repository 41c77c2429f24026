//! Transport progress reporting.
//!
//! Progress is observed on raw (pre-decompression) bytes as each chunk leaves
//! the [`ByteSource`](crate::source::ByteSource). Sinks are called inline on
//! the data path, so they must return quickly and never block.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw transport progress after one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub bytes_delivered: u64,
    pub bytes_total: Option<u64>,
}

impl ProgressEvent {
    /// Fraction of the announced total delivered so far, clamped to 1.0.
    pub fn fraction(&self) -> Option<f64> {
        match self.bytes_total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_delivered as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Observer of transport progress
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Logs a line each time another tenth of the transfer has arrived.
pub struct LogProgress {
    label: String,
    last_step: AtomicU64,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_step: AtomicU64::new(0),
        }
    }

    /// Returns the newly reached 10% step, if this event crossed one.
    fn crossed_step(&self, event: &ProgressEvent) -> Option<u64> {
        let step = (event.fraction()? * 10.0).floor() as u64;
        let previous = self.last_step.fetch_max(step, Ordering::Relaxed);
        (step > previous).then_some(step)
    }
}

impl ProgressSink for LogProgress {
    fn on_progress(&self, event: ProgressEvent) {
        match self.crossed_step(&event) {
            Some(step) => tracing::info!(
                source = %self.label,
                percent = step * 10,
                delivered = event.bytes_delivered,
                total = ?event.bytes_total,
                "transfer progress"
            ),
            None => tracing::trace!(
                source = %self.label,
                delivered = event.bytes_delivered,
                "chunk received"
            ),
        }
    }
}
