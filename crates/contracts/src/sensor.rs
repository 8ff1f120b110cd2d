//! 传感器载荷 - Ingestion 输出
//!
//! Pose, sparse point cloud and color image payloads as delivered by the
//! sensing service. Buffers are plain `Vec`s so caches can overwrite them in
//! place without reallocating.

use serde::{Deserialize, Serialize};

/// Pose tracking status code reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum PoseStatus {
    Initializing = 0,
    Valid = 1,
    Invalid = 2,
    #[default]
    Unknown = 3,
}

impl PoseStatus {
    /// Wire code
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire code; unrecognized codes map to `Unknown`
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Initializing,
            1 => Self::Valid,
            2 => Self::Invalid,
            _ => Self::Unknown,
        }
    }
}

/// 坐标系 (service frame codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum CoordinateFrame {
    GlobalWgs84 = 0,
    AreaDescription = 1,
    #[default]
    StartOfService = 2,
    PreviousDevicePose = 3,
    Device = 4,
    Imu = 5,
    Display = 6,
    CameraColor = 7,
    CameraDepth = 8,
    CameraFisheye = 9,
}

impl CoordinateFrame {
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::GlobalWgs84,
            1 => Self::AreaDescription,
            2 => Self::StartOfService,
            3 => Self::PreviousDevicePose,
            4 => Self::Device,
            5 => Self::Imu,
            6 => Self::Display,
            7 => Self::CameraColor,
            8 => Self::CameraDepth,
            9 => Self::CameraFisheye,
            _ => return None,
        })
    }
}

/// 6-DoF 位姿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseData {
    /// Rotation quaternion, (x, y, z, w)
    pub rotation: [f64; 4],

    /// Translation (x, y, z), meters
    pub translation: [f64; 3],

    pub status: PoseStatus,

    pub base_frame: CoordinateFrame,

    pub target_frame: CoordinateFrame,

    /// Service-reported confidence
    pub confidence: i32,

    /// Service-reported accuracy
    pub accuracy: f32,
}

impl Default for PoseData {
    fn default() -> Self {
        Self {
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
            status: PoseStatus::Unknown,
            base_frame: CoordinateFrame::StartOfService,
            target_frame: CoordinateFrame::Device,
            confidence: 0,
            accuracy: 0.0,
        }
    }
}

impl PoseData {
    /// Identity pose with the given status and frame pair
    pub fn identity(status: PoseStatus, base: CoordinateFrame, target: CoordinateFrame) -> Self {
        Self {
            status,
            base_frame: base,
            target_frame: target,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status == PoseStatus::Valid
    }
}

/// Opaque descriptor fields the service attaches to each point cloud.
/// Carried through to the point-cloud record header untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParcelDescriptor {
    pub size: i32,
    pub flags: i32,
    pub offset: i32,
    pub native_fd: i32,
}

/// 稀疏点云 (flat XYZ, depth camera frame)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud {
    /// Number of valid points; `points` holds at least `3 * num_points` floats
    pub num_points: u32,

    /// Flat x, y, z triples, meters
    pub points: Vec<f32>,

    pub descriptor: ParcelDescriptor,
}

impl PointCloud {
    /// Build from XYZ triples
    pub fn from_xyz(points: &[[f32; 3]]) -> Self {
        Self {
            num_points: points.len() as u32,
            points: points.iter().flatten().copied().collect(),
            descriptor: ParcelDescriptor::default(),
        }
    }

    /// Valid float slice (`3 * num_points` values)
    #[inline]
    pub fn xyz(&self) -> &[f32] {
        let len = (self.num_points as usize * 3).min(self.points.len());
        &self.points[..len]
    }

    /// Iterate points as `[x, y, z]`
    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.xyz().chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

/// 图像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// NV21: full-resolution Y plane followed by interleaved V/U at 2x2 subsampling
    #[default]
    YCrCb420Sp,
    Rgba8,
}

impl ImageFormat {
    /// Bytes required for a `width x height` image with the given row stride
    pub fn required_len(self, width: u32, height: u32, stride: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            ImageFormat::YCrCb420Sp => {
                let row = (stride as usize).max(w);
                // Odd rows: the last V/U pair straddles the row end
                row * h + row * h.div_ceil(2) + (row & 1)
            }
            ImageFormat::Rgba8 => (stride as usize).max(4 * w) * h,
        }
    }
}

/// 彩色图像帧
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorImage {
    pub width: u32,
    pub height: u32,

    /// Row pitch in bytes, of the luma plane for NV21 (`0` means tightly packed)
    pub stride: u32,

    pub format: ImageFormat,

    pub frame_number: i64,

    pub exposure_ns: i64,

    /// Raw pixel bytes
    pub data: Vec<u8>,
}

impl ColorImage {
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
