//! Capture session orchestration module.

mod monitor;
mod session;
mod stats;

pub use monitor::PreviewMonitor;
pub use session::{CaptureSession, StopReason};
pub use stats::SessionStats;
