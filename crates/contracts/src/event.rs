//! SensorEvent - 传感器服务事件
//!
//! All service callbacks are folded into one tagged event type and delivered
//! through a single sink, so ordering is decided in one place.

use std::sync::Arc;

use crate::{ColorImage, PointCloud, PoseData, Sample};

/// Tracking state change reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    /// Tracking (re)acquired
    Acquired,
    /// Tracking lost; any cached relative transform is stale
    Lost,
}

/// Tagged sensor event
#[derive(Debug, Clone)]
pub enum SensorEvent {
    Pose(Sample<PoseData>),
    PointCloud(Sample<PointCloud>),
    ColorFrame(Sample<ColorImage>),
    Tracking(TrackingEvent),
}

impl SensorEvent {
    /// Stream label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SensorEvent::Pose(_) => "pose",
            SensorEvent::PointCloud(_) => "point_cloud",
            SensorEvent::ColorFrame(_) => "color",
            SensorEvent::Tracking(_) => "tracking",
        }
    }

    /// Service timestamp, if the event carries one
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            SensorEvent::Pose(s) => Some(s.timestamp),
            SensorEvent::PointCloud(s) => Some(s.timestamp),
            SensorEvent::ColorFrame(s) => Some(s.timestamp),
            SensorEvent::Tracking(_) => None,
        }
    }
}

/// Event callback type
///
/// The service invokes it from its own callback threads.
pub type EventSink = Arc<dyn Fn(SensorEvent) + Send + Sync>;
