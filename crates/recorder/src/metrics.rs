//! Recorder metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one recorder
#[derive(Debug, Default)]
pub struct RecorderMetrics {
    /// Records appended
    records_written: AtomicU64,
    /// Payload bytes appended
    bytes_written: AtomicU64,
    /// Writes that failed and disabled a stream
    write_failures: AtomicU64,
    /// Saves rejected because the stream was not ready
    rejected: AtomicU64,
}

impl RecorderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn on_written(&self, bytes: usize) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written(),
            bytes_written: self.bytes_written(),
            write_failures: self.write_failures(),
            rejected: self.rejected(),
        }
    }
}

/// Snapshot of recorder metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_failures: u64,
    pub rejected: u64,
}
