//! Static-extrinsics transform provider

use std::sync::Arc;

use contracts::{
    ContractError, CoordinateFrame, Extrinsics, PoseData, PoseStatus, SensorService,
    TransformProvider,
};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};

/// Answers color/depth camera queries from fixed calibration
///
/// Not ready (`TrackingUnavailable`) until the service is connected, like a
/// real service before its first pose fix.
pub struct StaticTransformProvider {
    /// Pose of the color camera in the depth camera frame
    depth_from_color: Isometry3<f64>,
    service: Arc<dyn SensorService>,
}

impl StaticTransformProvider {
    pub fn new(extrinsics: &Extrinsics, service: Arc<dyn SensorService>) -> Self {
        let [x, y, z, w] = extrinsics.rotation;
        let [tx, ty, tz] = extrinsics.translation;
        Self {
            depth_from_color: Isometry3::from_parts(
                Translation3::new(tx, ty, tz),
                UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
            ),
            service,
        }
    }

    fn pose(iso: &Isometry3<f64>, base: CoordinateFrame, target: CoordinateFrame) -> PoseData {
        let q = iso.rotation.quaternion();
        let t = iso.translation.vector;
        PoseData {
            rotation: [q.i, q.j, q.k, q.w],
            translation: [t.x, t.y, t.z],
            status: PoseStatus::Valid,
            base_frame: base,
            target_frame: target,
            ..Default::default()
        }
    }
}

impl TransformProvider for StaticTransformProvider {
    fn relative_pose(
        &self,
        _timestamp: f64,
        base: CoordinateFrame,
        target: CoordinateFrame,
    ) -> Result<PoseData, ContractError> {
        if !self.service.is_connected() {
            return Err(ContractError::tracking_unavailable(format!(
                "{} service not connected",
                self.service.name()
            )));
        }

        use CoordinateFrame::{CameraColor, CameraDepth};
        let iso = match (base, target) {
            (b, t) if b == t => Isometry3::identity(),
            (CameraDepth, CameraColor) => self.depth_from_color,
            (CameraColor, CameraDepth) => self.depth_from_color.inverse(),
            _ => {
                return Err(ContractError::tracking_unavailable(format!(
                    "no static transform for {base:?} -> {target:?}"
                )))
            }
        };
        Ok(Self::pose(&iso, base, target))
    }
}
