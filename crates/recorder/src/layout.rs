//! On-disk session layout
//!
//! `<base_dir>/<app_name>/<yyyyMMddHHmmss>/{pose,color,point_cloud|depth}.bin`

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contracts::DepthRecordMode;

/// Session directory timestamp format
pub const SESSION_DIR_FORMAT: &str = "%Y%m%d%H%M%S";

/// One append-only record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStream {
    Pose,
    Color,
    PointCloud,
    Depth,
}

impl RecordStream {
    pub const ALL: [RecordStream; 4] = [
        RecordStream::Pose,
        RecordStream::Color,
        RecordStream::PointCloud,
        RecordStream::Depth,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            RecordStream::Pose => "pose.bin",
            RecordStream::Color => "color.bin",
            RecordStream::PointCloud => "point_cloud.bin",
            RecordStream::Depth => "depth.bin",
        }
    }

    /// Metric label
    pub fn label(self) -> &'static str {
        match self {
            RecordStream::Pose => "pose",
            RecordStream::Color => "color",
            RecordStream::PointCloud => "point_cloud",
            RecordStream::Depth => "depth",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Streams opened for a session
    pub fn for_depth_mode(mode: DepthRecordMode) -> [RecordStream; 3] {
        let depth = match mode {
            DepthRecordMode::PointCloud => RecordStream::PointCloud,
            DepthRecordMode::DepthImage => RecordStream::Depth,
        };
        [RecordStream::Pose, RecordStream::Color, depth]
    }
}

impl fmt::Display for RecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `<base_dir>/<app_name>/<yyyyMMddHHmmss>`
pub fn session_dir(base_dir: &Path, app_name: &str, started_at: DateTime<Local>) -> PathBuf {
    base_dir
        .join(app_name)
        .join(started_at.format(SESSION_DIR_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_dir_naming() {
        let t = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let dir = session_dir(Path::new("/data"), "rgbd", t);
        assert_eq!(dir, PathBuf::from("/data/rgbd/20240309070501"));
    }

    #[test]
    fn test_streams_per_depth_mode() {
        assert_eq!(
            RecordStream::for_depth_mode(DepthRecordMode::PointCloud)[2].file_name(),
            "point_cloud.bin"
        );
        assert_eq!(
            RecordStream::for_depth_mode(DepthRecordMode::DepthImage)[2].file_name(),
            "depth.bin"
        );
    }
}
