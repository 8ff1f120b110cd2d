//! Fusion processor on its own periodic thread

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use observability::{CaptureMetricsAggregator, MetricsSummary};
use parking_lot::Mutex;
use scheduler::PeriodicTask;

use crate::{CycleOutcome, FrameBuffer, FusionProcessor};

/// Running fusion loop
///
/// Cycle outcomes are folded into a shared aggregator for the run summary.
pub struct FusionLoop {
    task: PeriodicTask,
    frames: Arc<FrameBuffer>,
    aggregator: Arc<Mutex<CaptureMetricsAggregator>>,
}

impl FusionLoop {
    pub fn spawn(mut processor: FusionProcessor, interval: Duration) -> scheduler::Result<Self> {
        let frames = processor.frame_buffer().clone();
        let aggregator = Arc::new(Mutex::new(CaptureMetricsAggregator::new()));

        let cycle_stats = aggregator.clone();
        let task = PeriodicTask::spawn("fusion", interval, move || {
            let outcome = processor.run_cycle();
            let mut stats = cycle_stats.lock();
            match outcome {
                CycleOutcome::Produced { recorded } => {
                    stats.on_produced(recorded, processor.last_cycle_ms())
                }
                CycleOutcome::Skipped(reason) => stats.on_skipped(reason.as_str()),
            }
            ControlFlow::Continue(())
        })?;

        Ok(Self {
            task,
            frames,
            aggregator,
        })
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        &self.frames
    }

    /// Shared aggregator, also fed with storage fault counts by the monitor
    pub fn aggregator(&self) -> &Arc<Mutex<CaptureMetricsAggregator>> {
        &self.aggregator
    }

    pub fn summary(&self) -> MetricsSummary {
        self.aggregator.lock().summary()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Stop and join; returns the number of cycles run
    pub fn stop(&self) -> Option<u64> {
        self.task.stop()
    }
}
