//! Color-from-depth relative transform

use contracts::PoseData;
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion};

/// Rigid transform from a `(x, y, z, w)` quaternion and a translation
pub fn isometry_from_parts(rotation: [f64; 4], translation: [f64; 3]) -> Isometry3<f64> {
    let [x, y, z, w] = rotation;
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
    Isometry3::from_parts(
        Translation3::new(translation[0], translation[1], translation[2]),
        rotation,
    )
}

pub fn pose_to_isometry(pose: &PoseData) -> Isometry3<f64> {
    isometry_from_parts(pose.rotation, pose.translation)
}

/// Cached relative transform
///
/// Usable while its pose status is valid and no tracking loss has been
/// reported since it was computed.
#[derive(Debug, Clone)]
pub struct RelativeTransform {
    pose: PoseData,
    isometry: Isometry3<f64>,
    tracking_epoch: u64,
}

impl RelativeTransform {
    pub fn new(pose: PoseData, tracking_epoch: u64) -> Self {
        Self {
            isometry: pose_to_isometry(&pose),
            pose,
            tracking_epoch,
        }
    }

    pub fn is_valid_for(&self, tracking_epoch: u64) -> bool {
        self.pose.is_valid() && self.tracking_epoch == tracking_epoch
    }

    pub fn pose(&self) -> &PoseData {
        &self.pose
    }

    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }

    /// Tracking epoch the transform was computed in
    pub fn tracking_epoch(&self) -> u64 {
        self.tracking_epoch
    }
}
