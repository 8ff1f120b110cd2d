//! FusionProcessor - poll, align, fuse, publish, optionally record

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    CameraIntrinsics, ColorImage, ColorRecordMode, CoordinateFrame, DepthRecordMode,
    FusionConfig, PointCloud, PoseData, Sample, TransformProvider,
};
use recorder::Recorder;
use sample_store::{CachePayload, DataStore};
use tracing::{debug, instrument, trace};

use crate::colorize::DepthColorizer;
use crate::frame::FrameBuffer;
use crate::reproject::Reprojector;
use crate::transform::RelativeTransform;
use crate::yuv::color_to_rgba;

/// Why a cycle produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NoPointCloud,
    EmptyPointCloud,
    NoColorFrame,
    EmptyColorFrame,
    NoPose,
    PoseNotValid,
    TrackingUnavailable,
}

impl SkipReason {
    /// Metric / summary label
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoPointCloud => "no_point_cloud",
            SkipReason::EmptyPointCloud => "empty_point_cloud",
            SkipReason::NoColorFrame => "no_color_frame",
            SkipReason::EmptyColorFrame => "empty_color_frame",
            SkipReason::NoPose => "no_pose",
            SkipReason::PoseNotValid => "pose_not_valid",
            SkipReason::TrackingUnavailable => "tracking_unavailable",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one fusion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// A frame was published; `recorded` if every inline record write succeeded
    Produced { recorded: bool },
}

impl CycleOutcome {
    pub fn label(self) -> &'static str {
        match self {
            CycleOutcome::Skipped(reason) => reason.as_str(),
            CycleOutcome::Produced { .. } => "produced",
        }
    }

    pub fn is_produced(self) -> bool {
        matches!(self, CycleOutcome::Produced { .. })
    }
}

/// Per-resolution working buffers, reused across cycles
#[derive(Debug, Default)]
struct Scratch {
    intrinsics: Option<CameraIntrinsics>,
    depth: Vec<f32>,
    depth_rgba: Vec<u8>,
    color_rgba: Vec<u8>,
}

impl Scratch {
    /// Intrinsics scaled to `width x height`, recomputed only on resolution change
    fn intrinsics_for(&mut self, reference: &CameraIntrinsics, width: u32, height: u32) -> CameraIntrinsics {
        match self.intrinsics {
            Some(k) if k.width == width && k.height == height => k,
            _ => {
                let k = reference.scaled_to(width, height);
                debug!(width, height, fx = k.fx, fy = k.fy, "frame resolution changed");
                self.intrinsics = Some(k);
                k
            }
        }
    }
}

/// Depth + color fusion
///
/// Owned by the fusion thread; shares the data store, the transform provider,
/// the output frame buffer and (optionally) the recorder.
pub struct FusionProcessor {
    store: Arc<DataStore>,
    transforms: Arc<dyn TransformProvider>,
    frames: Arc<FrameBuffer>,
    recorder: Option<Arc<Recorder>>,
    intrinsics: CameraIntrinsics,
    colorizer: DepthColorizer,
    reprojector: Reprojector,
    relative: Option<RelativeTransform>,
    scratch: Scratch,
    last_cycle_ms: f64,
}

impl std::fmt::Debug for FusionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionProcessor")
            .field("intrinsics", &self.intrinsics)
            .field("max_depth", &self.colorizer.max_depth())
            .field("relative", &self.relative)
            .field("recording", &self.recorder.is_some())
            .finish()
    }
}

impl FusionProcessor {
    pub fn new(
        config: &FusionConfig,
        store: Arc<DataStore>,
        transforms: Arc<dyn TransformProvider>,
        frames: Arc<FrameBuffer>,
    ) -> Self {
        Self {
            store,
            transforms,
            frames,
            recorder: None,
            intrinsics: config.intrinsics,
            colorizer: DepthColorizer::new(config.max_depth_m),
            reprojector: Reprojector::new(config.splat_radius),
            relative: None,
            scratch: Scratch::default(),
            last_cycle_ms: 0.0,
        }
    }

    /// Record every produced frame inline
    pub fn with_recorder(mut self, recorder: Arc<Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        &self.frames
    }

    /// Duration of the last `run_cycle`
    pub fn last_cycle_ms(&self) -> f64 {
        self.last_cycle_ms
    }

    /// Currently cached color-from-depth transform
    pub fn relative_transform(&self) -> Option<&RelativeTransform> {
        self.relative.as_ref()
    }

    /// One scheduled cycle: pull samples from the store and fuse them
    ///
    /// Samples are consumed in order (cloud, color, pose) and only while the
    /// previous lookup succeeded.
    #[instrument(name = "fusion_cycle", level = "trace", skip(self))]
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        let outcome = self.poll_and_process();
        self.last_cycle_ms = started.elapsed().as_secs_f64() * 1000.0;

        observability::record_fusion_cycle(outcome.label(), self.last_cycle_ms);
        let stats = self.store.stats();
        observability::record_cache_occupancy("pose", stats.pose_occupied);
        observability::record_cache_occupancy("point_cloud", stats.point_cloud_occupied);
        observability::record_cache_occupancy("color", stats.color_occupied);

        trace!(outcome = outcome.label(), cycle_ms = self.last_cycle_ms, "fusion cycle finished");
        outcome
    }

    fn poll_and_process(&mut self) -> CycleOutcome {
        let Some(cloud) = self.store.latest_point_cloud() else {
            return CycleOutcome::Skipped(SkipReason::NoPointCloud);
        };
        let Some(color) = self.store.color_frame_near(cloud.timestamp) else {
            return CycleOutcome::Skipped(SkipReason::NoColorFrame);
        };
        let Some(pose) = self.store.pose_near(cloud.timestamp) else {
            return CycleOutcome::Skipped(SkipReason::NoPose);
        };
        self.process(&cloud, &color, &pose)
    }

    /// Fuse one aligned sample triple
    pub fn process(
        &mut self,
        cloud: &Sample<PointCloud>,
        color: &Sample<ColorImage>,
        pose: &Sample<PoseData>,
    ) -> CycleOutcome {
        if cloud.payload.num_points == 0 || cloud.payload.validate().is_err() {
            return CycleOutcome::Skipped(SkipReason::EmptyPointCloud);
        }
        if color.payload.width == 0 || color.payload.height == 0 || color.payload.validate().is_err() {
            return CycleOutcome::Skipped(SkipReason::EmptyColorFrame);
        }
        if !pose.payload.is_valid() {
            if self.relative.take().is_some() {
                debug!(status = ?pose.payload.status, "pose not valid, relative transform dropped");
            }
            return CycleOutcome::Skipped(SkipReason::PoseNotValid);
        }
        if let Err(reason) = self.ensure_relative_transform(cloud.timestamp) {
            return CycleOutcome::Skipped(reason);
        }
        let Some(relative) = self.relative.as_ref() else {
            return CycleOutcome::Skipped(SkipReason::TrackingUnavailable);
        };

        let (width, height) = (color.payload.width, color.payload.height);
        let k = self.scratch.intrinsics_for(&self.intrinsics, width, height);
        let projected =
            self.reprojector
                .reproject(&cloud.payload, relative.isometry(), &k, &mut self.scratch.depth);
        self.colorizer
            .colorize(&self.scratch.depth, &mut self.scratch.depth_rgba);
        color_to_rgba(&color.payload, &mut self.scratch.color_rgba);

        let generation = self.frames.publish(
            width,
            height,
            cloud.timestamp,
            &self.scratch.color_rgba,
            &self.scratch.depth_rgba,
        );
        trace!(
            generation,
            width,
            height,
            points = cloud.payload.num_points,
            projected,
            "fused frame published"
        );

        let recorded = self.record(cloud, color, pose);
        CycleOutcome::Produced { recorded }
    }

    /// Keep the cached transform current; recompute when missing, invalid or
    /// invalidated by a tracking loss
    fn ensure_relative_transform(&mut self, timestamp: f64) -> Result<(), SkipReason> {
        let epoch = self.store.tracking_epoch();
        if self.relative.as_ref().is_some_and(|t| t.is_valid_for(epoch)) {
            return Ok(());
        }

        match self
            .transforms
            .relative_pose(timestamp, CoordinateFrame::CameraColor, CoordinateFrame::CameraDepth)
        {
            Ok(pose) if pose.is_valid() => {
                debug!(
                    timestamp,
                    epoch,
                    translation = ?pose.translation,
                    "relative transform recomputed"
                );
                self.relative = Some(RelativeTransform::new(pose, epoch));
                Ok(())
            }
            Ok(pose) => {
                debug!(status = ?pose.status, "relative transform not valid yet");
                self.relative = None;
                Err(SkipReason::TrackingUnavailable)
            }
            Err(e) => {
                debug!(error = %e, "relative transform unavailable");
                self.relative = None;
                Err(SkipReason::TrackingUnavailable)
            }
        }
    }

    /// Inline recording, after the frame lock has been released
    fn record(
        &self,
        cloud: &Sample<PointCloud>,
        color: &Sample<ColorImage>,
        pose: &Sample<PoseData>,
    ) -> bool {
        let Some(recorder) = self.recorder.as_deref() else {
            return false;
        };
        if !recorder.is_ready() {
            return false;
        }

        let settings = recorder.settings();
        let depth = match settings.depth_mode {
            DepthRecordMode::PointCloud => recorder.save_point_cloud(cloud),
            DepthRecordMode::DepthImage => recorder.save_depth_image(&self.scratch.depth),
        };
        let color = match settings.color_mode {
            ColorRecordMode::Raw => recorder.save_color_image(&color.payload),
            ColorRecordMode::Rgba => recorder.save_color_rgba(&self.scratch.color_rgba),
        };
        let pose = recorder.save_pose(pose);

        depth.is_ok() && color.is_ok() && pose.is_ok()
    }
}
