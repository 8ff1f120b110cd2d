//! Sensing service boundary
//!
//! The pose/depth/color service is an external collaborator. The pipeline only
//! needs to connect an [`EventSink`] and to ask for the color-to-depth transform.

use crate::{ContractError, CoordinateFrame, EventSink, PoseData};

/// Sensing service abstraction
///
/// Implemented by the mock service and by any real device binding.
///
/// ```ignore
/// let service: Box<dyn SensorService> = make_service();
/// service.connect(Arc::new(|event| println!("{}", event.kind())))?;
/// // ...
/// service.disconnect();
/// ```
pub trait SensorService: Send + Sync {
    /// Service name
    fn name(&self) -> &str;

    /// Connect and start delivering events to `sink`
    ///
    /// Failure is a session fault. Connecting twice is a no-op.
    fn connect(&self, sink: EventSink) -> Result<(), ContractError>;

    /// Stop event delivery
    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

/// Relative pose lookup
pub trait TransformProvider: Send + Sync {
    /// Pose of `target` expressed in `base` at `timestamp`
    ///
    /// Fails with `TrackingUnavailable` while the session is not ready or
    /// tracking is lost.
    fn relative_pose(
        &self,
        timestamp: f64,
        base: CoordinateFrame,
        target: CoordinateFrame,
    ) -> Result<PoseData, ContractError>;
}
