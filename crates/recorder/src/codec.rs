//! Binary record layouts (little-endian)
//!
//! | record      | layout                                                                 |
//! |-------------|------------------------------------------------------------------------|
//! | pose        | `f64 ts, f64 rot[4], f64 trans[3], i32 status, i32 base, i32 target, i32 confidence, f32 accuracy` (84 B) |
//! | point cloud | `f64 ts, i32 n, i32 size, i32 flags, i32 offset, i32 native_fd` (28 B) + `n * 3` f32 |
//! | depth       | `pixel_count` f32                                                      |
//! | color       | raw bytes, no header                                                   |

use bytes::{Buf, BufMut};
use contracts::{CoordinateFrame, ParcelDescriptor, PointCloud, PoseData, PoseStatus};

use crate::CodecError;

/// 8 doubles + 4 ints + 1 float
pub const POSE_RECORD_LEN: usize = 8 * 8 + 4 * 4 + 4;

/// 1 double + 5 ints
pub const POINT_CLOUD_HEADER_LEN: usize = 8 + 5 * 4;

/// Decoded pose record
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRecord {
    pub timestamp: f64,
    pub pose: PoseData,
}

/// Decoded point-cloud record
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudRecord {
    pub timestamp: f64,
    pub cloud: PointCloud,
}

pub fn encode_pose(buf: &mut impl BufMut, timestamp: f64, pose: &PoseData) {
    buf.put_f64_le(timestamp);
    for v in pose.rotation {
        buf.put_f64_le(v);
    }
    for v in pose.translation {
        buf.put_f64_le(v);
    }
    buf.put_i32_le(pose.status.code());
    buf.put_i32_le(pose.base_frame.code());
    buf.put_i32_le(pose.target_frame.code());
    buf.put_i32_le(pose.confidence);
    buf.put_f32_le(pose.accuracy);
}

pub fn decode_pose(buf: &mut impl Buf) -> Result<PoseRecord, CodecError> {
    ensure(buf, POSE_RECORD_LEN, "pose record")?;

    let timestamp = buf.get_f64_le();
    let mut rotation = [0.0; 4];
    for v in &mut rotation {
        *v = buf.get_f64_le();
    }
    let mut translation = [0.0; 3];
    for v in &mut translation {
        *v = buf.get_f64_le();
    }
    let status = PoseStatus::from_code(buf.get_i32_le());
    let base_frame = frame(buf.get_i32_le())?;
    let target_frame = frame(buf.get_i32_le())?;
    let confidence = buf.get_i32_le();
    let accuracy = buf.get_f32_le();

    Ok(PoseRecord {
        timestamp,
        pose: PoseData {
            rotation,
            translation,
            status,
            base_frame,
            target_frame,
            confidence,
            accuracy,
        },
    })
}

/// Header followed by the valid `3 * num_points` floats
pub fn encode_point_cloud(buf: &mut impl BufMut, timestamp: f64, cloud: &PointCloud) {
    buf.put_f64_le(timestamp);
    buf.put_i32_le(cloud.num_points as i32);
    buf.put_i32_le(cloud.descriptor.size);
    buf.put_i32_le(cloud.descriptor.flags);
    buf.put_i32_le(cloud.descriptor.offset);
    buf.put_i32_le(cloud.descriptor.native_fd);
    put_f32s(buf, cloud.xyz());
}

pub fn decode_point_cloud(buf: &mut impl Buf) -> Result<PointCloudRecord, CodecError> {
    ensure(buf, POINT_CLOUD_HEADER_LEN, "point cloud header")?;

    let timestamp = buf.get_f64_le();
    let num_points = buf.get_i32_le();
    let descriptor = ParcelDescriptor {
        size: buf.get_i32_le(),
        flags: buf.get_i32_le(),
        offset: buf.get_i32_le(),
        native_fd: buf.get_i32_le(),
    };
    if num_points < 0 {
        return Err(CodecError::NegativeCount(num_points));
    }

    let floats = num_points as usize * 3;
    ensure(buf, floats * 4, "point cloud points")?;
    let points = (0..floats).map(|_| buf.get_f32_le()).collect();

    Ok(PointCloudRecord {
        timestamp,
        cloud: PointCloud {
            num_points: num_points as u32,
            points,
            descriptor,
        },
    })
}

/// Dense depth image, one f32 per pixel
pub fn encode_depth(buf: &mut impl BufMut, depth: &[f32]) {
    put_f32s(buf, depth);
}

pub fn decode_depth(buf: &mut impl Buf, pixel_count: usize) -> Result<Vec<f32>, CodecError> {
    ensure(buf, pixel_count * 4, "depth image")?;
    Ok((0..pixel_count).map(|_| buf.get_f32_le()).collect())
}

fn put_f32s(buf: &mut impl BufMut, values: &[f32]) {
    if cfg!(target_endian = "little") {
        buf.put_slice(bytemuck::cast_slice(values));
    } else {
        for v in values {
            buf.put_f32_le(*v);
        }
    }
}

fn ensure(buf: &impl Buf, needed: usize, what: &'static str) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated {
            what,
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

fn frame(code: i32) -> Result<CoordinateFrame, CodecError> {
    CoordinateFrame::from_code(code).ok_or(CodecError::UnknownFrame(code))
}
