//! Session statistics.

use std::path::PathBuf;
use std::time::Duration;

use observability::MetricsSummary;

use super::StopReason;

/// Statistics from a capture session
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub stop_reason: StopReason,

    /// Wall time from startup to the end of shutdown
    pub duration: Duration,

    /// Events the pump handed to the data store
    pub events_handled: u64,

    /// Events dropped at the full channel
    pub events_dropped: u64,

    /// Events the data store rejected
    pub publish_errors: u64,

    /// Distinct frames picked up by the preview monitor
    pub previews: u64,

    /// Fusion cycle outcomes and storage faults
    pub fusion: MetricsSummary,

    /// Set when recording was enabled and started
    pub session_dir: Option<PathBuf>,
    pub records_written: u64,
    pub bytes_written: u64,
}

impl SessionStats {
    /// Fused frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.fusion.produced_frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Capture Session ===\n");
        println!("Stopped by: {}", self.stop_reason);
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Fused FPS: {:.2}", self.fps());
        println!(
            "Events: {} handled, {} dropped, {} rejected",
            self.events_handled, self.events_dropped, self.publish_errors
        );
        println!("Preview frames: {}", self.previews);

        println!();
        print!("{}", self.fusion);

        if let Some(dir) = &self.session_dir {
            println!("\nRecording: {}", dir.display());
            println!(
                "  {} records, {} bytes",
                self.records_written, self.bytes_written
            );
        }
        println!();
    }
}
