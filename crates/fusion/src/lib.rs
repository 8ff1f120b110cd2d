//! # Fusion
//!
//! 深度与彩色图像融合模块。
//!
//! 每个周期：
//! - 取最新点云，再取最近时间戳的彩色帧与位姿
//! - 维护彩色相机相对深度相机的变换 (跟踪丢失后重新计算)
//! - 稀疏点云重投影为稠密深度图，并按深度着色
//! - NV21 → RGBA
//! - 写入双缓冲 `FrameBuffer`，可选内联录制
//!
//! ## 使用示例
//!
//! ```ignore
//! use fusion::{FrameBuffer, FusionLoop, FusionProcessor};
//!
//! let frames = Arc::new(FrameBuffer::new());
//! let processor = FusionProcessor::new(&config.fusion, store, transforms, frames.clone());
//! let fusion = FusionLoop::spawn(processor, Duration::from_millis(config.fusion.interval_ms))?;
//! // ...
//! fusion.stop();
//! println!("{}", fusion.summary());
//! ```

mod colorize;
mod error;
mod frame;
mod fusion_loop;
mod processor;
mod reproject;
mod transform;
mod yuv;

pub use colorize::{
    hsv_to_rgb, DepthBand, DepthColorizer, MID_ALPHA, PALETTE_SIZE, TOO_CLOSE_RGBA, TOO_FAR_RGBA,
};
pub use error::{FrameError, Result};
pub use frame::{FrameBuffer, FrameInfo, FusedFrame};
pub use fusion_loop::FusionLoop;
pub use processor::{CycleOutcome, FusionProcessor, SkipReason};
pub use reproject::Reprojector;
pub use transform::{isometry_from_parts, pose_to_isometry, RelativeTransform};
pub use yuv::{color_to_rgba, nv21_to_rgba};
