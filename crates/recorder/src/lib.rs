//! # Recorder
//!
//! 二进制录制模块。
//!
//! 负责：
//! - 固定布局的记录编码 (pose 84 B, point cloud 28 B header)
//! - 会话目录 `<app>/<yyyyMMddHHmmss>` 与追加写入
//! - 存储故障入队，不影响融合主链路
//! - 独立线程录制 (`RecordingLoop`)
//! - 录制回读 (`inspect`)

pub mod codec;
mod error;
mod layout;
mod metrics;
pub mod reader;
mod recorder;
mod recording_loop;

pub use codec::{PointCloudRecord, PoseRecord, POINT_CLOUD_HEADER_LEN, POSE_RECORD_LEN};
pub use error::{CodecError, RecorderError, Result};
pub use layout::{session_dir, RecordStream, SESSION_DIR_FORMAT};
pub use metrics::{MetricsSnapshot, RecorderMetrics};
pub use reader::SessionSummary;
pub use recorder::{Recorder, RecorderSettings};
pub use recording_loop::{record_once, RecordPass, RecordingLoop};
