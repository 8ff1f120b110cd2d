//! Record readers for recorded sessions
//!
//! Pose and point-cloud records are self-delimiting. Color and depth records
//! carry no header, so the frame size must come from the caller.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::{Buf, Bytes};

use crate::codec::{decode_depth, decode_point_cloud, decode_pose, PointCloudRecord, PoseRecord};
use crate::{RecordStream, RecorderError, Result};

fn read_file(path: &Path) -> Result<Bytes> {
    fs::read(path)
        .map(Bytes::from)
        .map_err(|source| RecorderError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode records until the buffer is exhausted
fn decode_all<T>(
    path: &Path,
    decode: impl Fn(&mut Bytes) -> std::result::Result<T, crate::CodecError>,
) -> Result<Vec<T>> {
    let mut buf = read_file(path)?;
    let mut records = Vec::new();
    while buf.has_remaining() {
        let record = decode(&mut buf).map_err(|source| RecorderError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read every record of a `pose.bin`
pub fn read_pose_records(path: &Path) -> Result<Vec<PoseRecord>> {
    decode_all(path, |buf| decode_pose(buf))
}

/// Read every record of a `point_cloud.bin`
pub fn read_point_cloud_records(path: &Path) -> Result<Vec<PointCloudRecord>> {
    decode_all(path, |buf| decode_point_cloud(buf))
}

/// Read a `depth.bin` of `pixel_count`-sized frames
pub fn read_depth_frames(path: &Path, pixel_count: usize) -> Result<Vec<Vec<f32>>> {
    if pixel_count == 0 {
        return Ok(Vec::new());
    }
    decode_all(path, |buf| decode_depth(buf, pixel_count))
}

/// Split a `color.bin` into `frame_len`-byte frames; a trailing partial frame is an error
pub fn read_color_frames(path: &Path, frame_len: usize) -> Result<Vec<Bytes>> {
    let mut buf = read_file(path)?;
    if frame_len == 0 {
        return Ok(Vec::new());
    }
    let mut frames = Vec::with_capacity(buf.len() / frame_len);
    while buf.has_remaining() {
        if buf.remaining() < frame_len {
            return Err(RecorderError::Decode {
                path: path.to_path_buf(),
                source: crate::CodecError::Truncated {
                    what: "color frame",
                    needed: frame_len,
                    available: buf.remaining(),
                },
            });
        }
        frames.push(buf.split_to(frame_len));
    }
    Ok(frames)
}

/// Overview of a recorded session directory
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub dir: PathBuf,
    pub pose_records: usize,
    pub valid_poses: usize,
    pub point_cloud_records: usize,
    pub total_points: u64,
    /// First and last record timestamp over pose and point-cloud streams
    pub time_span: Option<(f64, f64)>,
    pub color_bytes: u64,
    pub depth_bytes: u64,
}

impl SessionSummary {
    /// Scan every stream file present in `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let mut summary = SessionSummary {
            dir: dir.to_path_buf(),
            ..Default::default()
        };
        let mut span = SpanTracker::default();

        let pose_path = dir.join(RecordStream::Pose.file_name());
        if pose_path.exists() {
            let poses = read_pose_records(&pose_path)?;
            summary.pose_records = poses.len();
            summary.valid_poses = poses.iter().filter(|r| r.pose.is_valid()).count();
            poses.iter().for_each(|r| span.push(r.timestamp));
        }

        let cloud_path = dir.join(RecordStream::PointCloud.file_name());
        if cloud_path.exists() {
            let clouds = read_point_cloud_records(&cloud_path)?;
            summary.point_cloud_records = clouds.len();
            summary.total_points = clouds.iter().map(|r| r.cloud.num_points as u64).sum();
            clouds.iter().for_each(|r| span.push(r.timestamp));
        }

        summary.color_bytes = file_len(&dir.join(RecordStream::Color.file_name()));
        summary.depth_bytes = file_len(&dir.join(RecordStream::Depth.file_name()));
        summary.time_span = span.range();
        Ok(summary)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Recording {} ===", self.dir.display())?;
        writeln!(
            f,
            "Pose records: {} ({} valid)",
            self.pose_records, self.valid_poses
        )?;
        writeln!(
            f,
            "Point cloud records: {} ({} points)",
            self.point_cloud_records, self.total_points
        )?;
        writeln!(f, "Color bytes: {}", self.color_bytes)?;
        writeln!(f, "Depth bytes: {}", self.depth_bytes)?;
        match self.time_span {
            Some((first, last)) => writeln!(
                f,
                "Time span: {:.3}s .. {:.3}s ({:.3}s)",
                first,
                last,
                last - first
            ),
            None => writeln!(f, "Time span: N/A"),
        }
    }
}

#[derive(Default)]
struct SpanTracker(Option<(f64, f64)>);

impl SpanTracker {
    fn push(&mut self, ts: f64) {
        self.0 = Some(match self.0 {
            Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
            None => (ts, ts),
        });
    }

    fn range(&self) -> Option<(f64, f64)> {
        self.0
    }
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
