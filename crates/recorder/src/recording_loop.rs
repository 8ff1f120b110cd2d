//! Threaded recording: pull aligned samples from the data store on a fixed delay

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use sample_store::DataStore;
use scheduler::PeriodicTask;
use tracing::{debug, instrument};

use crate::Recorder;

/// What one recording pass wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordPass {
    pub point_cloud: bool,
    pub color: bool,
    pub pose: bool,
}

impl RecordPass {
    pub fn wrote_anything(&self) -> bool {
        self.point_cloud || self.color || self.pose
    }
}

/// Recording loop on its own thread
///
/// Competes with the fusion processor for samples: whatever this loop
/// consumes, fusion no longer sees, and vice versa.
pub struct RecordingLoop {
    task: PeriodicTask,
}

impl RecordingLoop {
    pub fn spawn(
        store: Arc<DataStore>,
        recorder: Arc<Recorder>,
        interval: Duration,
    ) -> scheduler::Result<Self> {
        let task = PeriodicTask::spawn("recorder", interval, move || {
            record_once(&store, &recorder);
            ControlFlow::Continue(())
        })?;
        Ok(Self { task })
    }

    /// Stop and join; returns the number of passes run
    pub fn stop(&self) -> Option<u64> {
        self.task.stop()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

/// One pass: latest point cloud, then the color frame and pose nearest to it
///
/// Does nothing while the recorder is not ready. Write failures are already
/// queued as faults by the recorder.
#[instrument(name = "record_pass", level = "trace", skip_all)]
pub fn record_once(store: &DataStore, recorder: &Recorder) -> RecordPass {
    let mut pass = RecordPass::default();
    if !recorder.is_ready() {
        return pass;
    }

    let Some(cloud) = store.latest_point_cloud() else {
        return pass;
    };
    let color = store.color_frame_near(cloud.timestamp);
    let pose = store.pose_near(cloud.timestamp);

    pass.point_cloud = recorder.save_point_cloud(&cloud).is_ok();
    if let Some(color) = &color {
        pass.color = recorder.save_color_image(&color.payload).is_ok();
    }
    if let Some(pose) = &pose {
        pass.pose = recorder.save_pose(pose).is_ok();
    }

    debug!(
        timestamp = cloud.timestamp,
        color = pass.color,
        pose = pass.pose,
        "recorded point cloud"
    );
    pass
}
