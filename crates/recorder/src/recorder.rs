//! Recorder - append-only binary capture of pose, color and depth streams

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use chrono::Local;
use contracts::{
    ColorImage, ColorRecordMode, ContractError, DepthRecordMode, PointCloud, PoseData,
    RecorderConfig, Sample,
};
use parking_lot::Mutex;
use scheduler::{FaultQueue, Lifecycle};
use tracing::{debug, error, info, instrument, trace};

use crate::codec::{encode_depth, encode_point_cloud, encode_pose};
use crate::layout::session_dir;
use crate::{MetricsSnapshot, RecordStream, RecorderError, RecorderMetrics, Result};

/// Recorder settings
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub base_dir: PathBuf,
    pub app_name: String,
    pub depth_mode: DepthRecordMode,
    pub color_mode: ColorRecordMode,
}

impl RecorderSettings {
    pub fn from_config(config: &RecorderConfig, app_name: &str) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_dir),
            app_name: app_name.to_string(),
            depth_mode: config.depth_mode,
            color_mode: config.color_mode,
        }
    }
}

/// Unbuffered: every record reaches the file before `save_*` returns
struct StreamWriter {
    path: PathBuf,
    file: File,
}

#[derive(Default)]
struct Streams {
    dir: Option<PathBuf>,
    writers: [Option<StreamWriter>; 4],
    /// Reused encode buffer
    scratch: BytesMut,
}

/// Binary recorder
///
/// One append-mode file per stream under a timestamped session directory.
/// Every failure is a storage fault: it is logged, queued for the monitor
/// and never stops the caller. A failed write disables only its own stream.
pub struct Recorder {
    settings: RecorderSettings,
    lifecycle: Lifecycle,
    streams: Mutex<Streams>,
    faults: FaultQueue<ContractError>,
    metrics: RecorderMetrics,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("app_name", &self.settings.app_name)
            .field("state", &self.lifecycle.state())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl Recorder {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            settings,
            lifecycle: Lifecycle::new(),
            streams: Mutex::new(Streams::default()),
            faults: FaultQueue::new(),
            metrics: RecorderMetrics::new(),
        }
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Create the session directory and open every stream
    ///
    /// On failure nothing stays open and `is_ready()` remains false.
    #[instrument(name = "recorder_start", skip(self), fields(app = %self.settings.app_name))]
    pub fn start(&self) -> Result<PathBuf> {
        let dir = session_dir(&self.settings.base_dir, &self.settings.app_name, Local::now());
        self.start_in(dir)
    }

    fn start_in(&self, dir: PathBuf) -> Result<PathBuf> {
        self.lifecycle
            .start()
            .map_err(|_| RecorderError::AlreadyStarted)?;

        match open_streams(&dir, self.settings.depth_mode) {
            Ok(writers) => {
                let mut streams = self.streams.lock();
                streams.writers = writers;
                streams.dir = Some(dir.clone());
                info!(dir = %dir.display(), depth_mode = ?self.settings.depth_mode, "recording started");
                Ok(dir)
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to open record streams, recording disabled");
                self.push_fault(&e);
                self.lifecycle.request_stop();
                self.lifecycle.mark_stopped();
                Err(e)
            }
        }
    }

    /// Flush and close every open stream
    ///
    /// Each close is attempted independently. Returns the number of streams
    /// that failed to close.
    #[instrument(name = "recorder_stop", skip(self))]
    pub fn stop(&self) -> usize {
        if !self.lifecycle.request_stop() {
            return 0;
        }

        let writers = std::mem::take(&mut self.streams.lock().writers);
        let mut failures = 0;
        for (stream, slot) in RecordStream::ALL.into_iter().zip(writers) {
            let Some(StreamWriter { path, file }) = slot else {
                continue;
            };
            debug!(%stream, path = %path.display(), "closing record stream");
            if let Err(source) = file.sync_all() {
                failures += 1;
                let e = RecorderError::Close { stream, source };
                error!(error = %e, "close failed");
                self.push_fault(&e);
            }
        }

        self.lifecycle.mark_stopped();
        info!(
            failures,
            records = self.metrics.records_written(),
            bytes = self.metrics.bytes_written(),
            "recording stopped"
        );
        failures
    }

    /// Started and at least one stream still writable
    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_running() && self.streams.lock().writers.iter().any(Option::is_some)
    }

    /// Whether `stream` is open and writable
    pub fn is_stream_ready(&self, stream: RecordStream) -> bool {
        self.streams.lock().writers[stream.index()].is_some()
    }

    /// Directory of the current (or last) session
    pub fn session_dir(&self) -> Option<PathBuf> {
        self.streams.lock().dir.clone()
    }

    pub fn save_pose(&self, sample: &Sample<PoseData>) -> Result<()> {
        self.write_record(
            RecordStream::Pose,
            |buf| encode_pose(buf, sample.timestamp, &sample.payload),
            &[],
        )
    }

    /// Source bytes as delivered by the camera
    pub fn save_color_image(&self, image: &ColorImage) -> Result<()> {
        self.write_record(RecordStream::Color, |_| {}, &image.data)
    }

    /// Converted RGBA8 frame
    pub fn save_color_rgba(&self, rgba: &[u8]) -> Result<()> {
        self.write_record(RecordStream::Color, |_| {}, rgba)
    }

    pub fn save_point_cloud(&self, sample: &Sample<PointCloud>) -> Result<()> {
        self.write_record(
            RecordStream::PointCloud,
            |buf| encode_point_cloud(buf, sample.timestamp, &sample.payload),
            &[],
        )
    }

    /// Dense per-pixel depth
    pub fn save_depth_image(&self, depth: &[f32]) -> Result<()> {
        self.write_record(RecordStream::Depth, |buf| encode_depth(buf, depth), &[])
    }

    /// Take every queued storage fault
    pub fn drain_faults(&self) -> Vec<ContractError> {
        self.faults.drain()
    }

    /// Faults reported since construction
    pub fn fault_total(&self) -> u64 {
        self.faults.total()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Append `encode` output followed by `body` to `stream`
    fn write_record(
        &self,
        stream: RecordStream,
        encode: impl FnOnce(&mut BytesMut),
        body: &[u8],
    ) -> Result<()> {
        let mut guard = self.streams.lock();
        let streams = &mut *guard;

        let Some(target) = streams.writers[stream.index()].as_mut() else {
            drop(guard);
            self.metrics.inc_rejected();
            let e = RecorderError::NotReady { stream };
            trace!(%stream, "record rejected, stream not ready");
            self.push_fault(&e);
            return Err(e);
        };

        // One write per record
        streams.scratch.clear();
        encode(&mut streams.scratch);
        streams.scratch.extend_from_slice(body);
        let written = streams.scratch.len();

        match target.file.write_all(&streams.scratch) {
            Ok(()) => {
                self.metrics.on_written(written);
                observability::record_record_written(stream.label(), written);
                trace!(%stream, bytes = written, "record written");
                Ok(())
            }
            Err(source) => {
                let path = target.path.clone();
                streams.writers[stream.index()] = None;
                drop(guard);

                self.metrics.inc_write_failures();
                let e = RecorderError::Write { stream, source };
                error!(path = %path.display(), error = %e, "write failed, stream disabled");
                self.push_fault(&e);
                Err(e)
            }
        }
    }

    fn push_fault(&self, e: &RecorderError) {
        observability::record_storage_fault(e.metric_label());
        self.faults
            .push(ContractError::storage_fault(e.target(), e.to_string()));
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_streams(dir: &Path, depth_mode: DepthRecordMode) -> Result<[Option<StreamWriter>; 4]> {
    fs::create_dir_all(dir).map_err(|source| RecorderError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut writers: [Option<StreamWriter>; 4] = Default::default();
    for stream in RecordStream::for_depth_mode(depth_mode) {
        let path = dir.join(stream.file_name());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RecorderError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(%stream, path = %path.display(), "record stream opened");
        writers[stream.index()] = Some(StreamWriter { path, file });
    }
    Ok(writers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{POINT_CLOUD_HEADER_LEN, POSE_RECORD_LEN};
    use contracts::{ImageFormat, PoseStatus};

    fn make_settings(base: &Path, depth_mode: DepthRecordMode) -> RecorderSettings {
        RecorderSettings {
            base_dir: base.to_path_buf(),
            app_name: "test-app".to_string(),
            depth_mode,
            color_mode: ColorRecordMode::Raw,
        }
    }

    fn make_pose(ts: f64) -> Sample<PoseData> {
        Sample::new(
            ts,
            PoseData {
                status: PoseStatus::Valid,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_start_creates_session_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        assert!(!recorder.is_ready());

        let dir = recorder.start().unwrap();
        assert!(recorder.is_ready());
        assert!(dir.starts_with(tmp.path().join("test-app")));
        let stamp = dir.file_name().unwrap().to_str().unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));

        for name in ["pose.bin", "color.bin", "point_cloud.bin"] {
            assert!(dir.join(name).exists(), "{name} missing");
        }
        assert!(!dir.join("depth.bin").exists());
        assert_eq!(recorder.stop(), 0);
        assert!(!recorder.is_ready());
    }

    #[test]
    fn test_records_are_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        let dir = recorder.start().unwrap();

        recorder.save_pose(&make_pose(1.0)).unwrap();
        recorder.save_pose(&make_pose(2.0)).unwrap();
        let cloud = Sample::new(1.0, PointCloud::from_xyz(&[[0.0, 0.0, 1.0]; 5]));
        recorder.save_point_cloud(&cloud).unwrap();
        let img = ColorImage {
            width: 2,
            height: 2,
            format: ImageFormat::Rgba8,
            data: vec![7; 16],
            ..Default::default()
        };
        recorder.save_color_image(&img).unwrap();
        recorder.save_color_rgba(&[1; 16]).unwrap();
        recorder.stop();

        let len = |name: &str| fs::metadata(dir.join(name)).unwrap().len() as usize;
        assert_eq!(len("pose.bin"), 2 * POSE_RECORD_LEN);
        assert_eq!(len("point_cloud.bin"), POINT_CLOUD_HEADER_LEN + 5 * 12);
        assert_eq!(len("color.bin"), 32);

        let m = recorder.metrics();
        assert_eq!(m.records_written, 5);
        assert_eq!(m.write_failures, 0);
    }

    #[test]
    fn test_depth_mode_writes_depth_bin() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::DepthImage));
        let dir = recorder.start().unwrap();

        recorder.save_depth_image(&[1.0; 12]).unwrap();
        let cloud = Sample::new(1.0, PointCloud::from_xyz(&[[0.0; 3]]));
        assert!(matches!(
            recorder.save_point_cloud(&cloud),
            Err(RecorderError::NotReady {
                stream: RecordStream::PointCloud
            })
        ));
        recorder.stop();

        assert_eq!(fs::metadata(dir.join("depth.bin")).unwrap().len(), 48);
        assert!(!dir.join("point_cloud.bin").exists());
    }

    #[test]
    fn test_save_before_start_queues_fault() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));

        assert!(recorder.save_pose(&make_pose(1.0)).is_err());
        assert!(recorder.save_color_rgba(&[0; 4]).is_err());

        let faults = recorder.drain_faults();
        assert_eq!(faults.len(), 2);
        assert!(matches!(faults[0], ContractError::StorageFault { .. }));
        assert!(recorder.drain_faults().is_empty());
        assert_eq!(recorder.metrics().rejected, 2);
    }

    #[test]
    fn test_open_failure_leaves_not_ready() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the app directory should be
        let blocker = tmp.path().join("test-app");
        fs::write(&blocker, b"not a dir").unwrap();

        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        let err = recorder.start().unwrap_err();
        assert!(matches!(err, RecorderError::CreateDir { .. }));
        assert!(!recorder.is_ready());
        assert_eq!(recorder.drain_faults().len(), 1);

        // Not fatal: saves are rejected, stop is a no-op
        assert!(recorder.save_pose(&make_pose(1.0)).is_err());
        assert_eq!(recorder.stop(), 0);
    }

    #[test]
    fn test_double_start_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        recorder.start().unwrap();
        assert!(matches!(recorder.start(), Err(RecorderError::AlreadyStarted)));
        recorder.stop();
    }

    #[test]
    fn test_restart_opens_new_session() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        recorder.start().unwrap();
        recorder.save_pose(&make_pose(1.0)).unwrap();
        recorder.stop();

        let dir = recorder.start().unwrap();
        assert!(recorder.is_ready());
        recorder.save_pose(&make_pose(2.0)).unwrap();
        recorder.stop();
        assert!(fs::metadata(dir.join("pose.bin")).unwrap().len() >= POSE_RECORD_LEN as u64);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_disables_only_that_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("test-app").join("20240101000000");
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink("/dev/full", dir.join("pose.bin")).unwrap();

        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        recorder.start_in(dir.clone()).unwrap();
        assert!(recorder.is_ready());

        // The very first record fails, not a later flush
        assert!(matches!(
            recorder.save_pose(&make_pose(1.0)),
            Err(RecorderError::Write {
                stream: RecordStream::Pose,
                ..
            })
        ));
        assert!(!recorder.is_stream_ready(RecordStream::Pose));
        assert_eq!(recorder.drain_faults().len(), 1);

        assert!(matches!(
            recorder.save_pose(&make_pose(2.0)),
            Err(RecorderError::NotReady { .. })
        ));

        // Remaining streams keep recording
        assert!(recorder.is_ready());
        recorder.save_color_rgba(&[9; 64 * 1024]).unwrap();

        let m = recorder.metrics();
        assert_eq!(m.records_written, 1);
        assert_eq!(m.bytes_written, 64 * 1024);
        assert_eq!(m.write_failures, 1);
        assert_eq!(m.rejected, 1);

        assert_eq!(recorder.stop(), 0);
        assert_eq!(fs::metadata(dir.join("color.bin")).unwrap().len(), 64 * 1024);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_close_failure_is_queued() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("test-app").join("20240101000000");
        fs::create_dir_all(&dir).unwrap();
        // fsync on a character device fails with EINVAL
        std::os::unix::fs::symlink("/dev/full", dir.join("color.bin")).unwrap();

        let recorder = Recorder::new(make_settings(tmp.path(), DepthRecordMode::PointCloud));
        recorder.start_in(dir).unwrap();
        recorder.save_pose(&make_pose(1.0)).unwrap();

        assert_eq!(recorder.stop(), 1);
        let faults = recorder.drain_faults();
        assert_eq!(faults.len(), 1);
        assert!(faults[0].to_string().contains("color.bin"));
    }
}
