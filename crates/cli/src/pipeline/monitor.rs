//! Preview monitor - periodic frame copy-out and storage fault reporting

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fusion::{FrameBuffer, FrameError};
use observability::CaptureMetricsAggregator;
use parking_lot::Mutex;
use recorder::Recorder;
use scheduler::PeriodicTask;
use tracing::{debug, trace, warn};

/// Stand-in for a preview surface
///
/// Copies the latest fused frame into its own buffers on every tick and
/// drains the recorder's fault queue into the run aggregator. The first
/// storage fault raises one user-visible warning; later ones are counted.
pub struct PreviewMonitor {
    task: PeriodicTask,
    state: Arc<MonitorState>,
}

struct MonitorState {
    recorder: Option<Arc<Recorder>>,
    aggregator: Arc<Mutex<CaptureMetricsAggregator>>,
    previews: AtomicU64,
    warned: Mutex<bool>,
}

impl MonitorState {
    fn drain_faults(&self) -> usize {
        let Some(recorder) = &self.recorder else {
            return 0;
        };
        let faults = recorder.drain_faults();
        if faults.is_empty() {
            return 0;
        }

        for fault in &faults {
            debug!(error = %fault, "storage fault");
        }
        self.aggregator.lock().on_storage_faults(faults.len());

        let mut warned = self.warned.lock();
        if !*warned {
            *warned = true;
            warn!(
                faults = faults.len(),
                first = %faults[0],
                "storage faults detected, affected record streams are disabled"
            );
        }
        faults.len()
    }
}

/// Reused copy-out destinations
#[derive(Default)]
struct PreviewBuffers {
    color: Vec<u8>,
    depth: Vec<u8>,
}

impl PreviewBuffers {
    fn copy_from(&mut self, frames: &FrameBuffer) -> Option<u64> {
        if !frames.is_buffer_ready() {
            return None;
        }
        let (width, height) = frames.image_size();
        let len = width as usize * height as usize * 4;
        if self.color.len() < len {
            self.color.resize(len, 0);
            self.depth.resize(len, 0);
        }

        match frames.copy_out(&mut self.color, &mut self.depth) {
            Ok(info) => {
                trace!(
                    width = info.width,
                    height = info.height,
                    timestamp = info.timestamp,
                    generation = info.generation,
                    "preview frame copied"
                );
                Some(info.generation)
            }
            // Resolution changed between size query and copy; next tick catches up
            Err(FrameError::BufferTooSmall { .. }) => None,
            Err(FrameError::NotReady) => None,
        }
    }
}

impl PreviewMonitor {
    pub fn spawn(
        frames: Arc<FrameBuffer>,
        recorder: Option<Arc<Recorder>>,
        aggregator: Arc<Mutex<CaptureMetricsAggregator>>,
        interval: Duration,
    ) -> scheduler::Result<Self> {
        let state = Arc::new(MonitorState {
            recorder,
            aggregator,
            previews: AtomicU64::new(0),
            warned: Mutex::new(false),
        });

        let tick_state = state.clone();
        let mut buffers = PreviewBuffers::default();
        let mut last_generation = 0;
        let task = PeriodicTask::spawn("preview", interval, move || {
            if let Some(generation) = buffers.copy_from(&frames) {
                if generation != last_generation {
                    last_generation = generation;
                    tick_state.previews.fetch_add(1, Ordering::Relaxed);
                }
            }
            tick_state.drain_faults();
            ControlFlow::Continue(())
        })?;

        Ok(Self { task, state })
    }

    /// Distinct frames shown so far
    pub fn previews(&self) -> u64 {
        self.state.previews.load(Ordering::Relaxed)
    }

    /// Drain faults outside the periodic tick (used after the recorder closes)
    pub fn flush_faults(&self) -> usize {
        self.state.drain_faults()
    }

    pub fn stop(&self) -> Option<u64> {
        self.task.stop()
    }
}
