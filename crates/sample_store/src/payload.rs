//! Payload validation and in-place overwrite per stream

use contracts::{ColorImage, ImageFormat, PointCloud, PoseData};

/// Payload stored in a [`TimestampCache`](crate::TimestampCache)
pub trait CachePayload: Default + Clone + Send + 'static {
    /// Stream label for logs and metrics
    const STREAM: &'static str;

    /// Reject empty or malformed payloads
    fn validate(&self) -> Result<(), String>;

    /// Copy `src` into `self`, reusing existing buffers.
    /// Buffers grow when needed and are never shrunk.
    fn overwrite_from(&mut self, src: &Self) {
        self.clone_from(src);
    }
}

impl CachePayload for PoseData {
    const STREAM: &'static str = "pose";

    fn validate(&self) -> Result<(), String> {
        if self.rotation.iter().chain(&self.translation).any(|v| !v.is_finite()) {
            return Err("non-finite rotation or translation".into());
        }
        if !self.accuracy.is_finite() {
            return Err("non-finite accuracy".into());
        }
        Ok(())
    }
}

impl CachePayload for PointCloud {
    const STREAM: &'static str = "point_cloud";

    fn validate(&self) -> Result<(), String> {
        if self.num_points == 0 {
            return Err("point cloud has no points".into());
        }
        let needed = self.num_points as usize * 3;
        if self.points.len() < needed {
            return Err(format!(
                "point buffer holds {} floats, {} points need {}",
                self.points.len(),
                self.num_points,
                needed
            ));
        }
        Ok(())
    }

    fn overwrite_from(&mut self, src: &Self) {
        self.num_points = src.num_points;
        self.descriptor = src.descriptor;
        self.points.clear();
        self.points.extend_from_slice(&src.points);
    }
}

impl CachePayload for ColorImage {
    const STREAM: &'static str = "color";

    fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("zero image size {}x{}", self.width, self.height));
        }
        let min_stride = match self.format {
            ImageFormat::YCrCb420Sp => self.width,
            ImageFormat::Rgba8 => self.width.saturating_mul(4),
        };
        if self.stride != 0 && self.stride < min_stride {
            return Err(format!("stride {} below row length {}", self.stride, min_stride));
        }
        let needed = self.format.required_len(self.width, self.height, self.stride);
        if self.data.len() < needed {
            return Err(format!(
                "{:?} {}x{} needs {} bytes, got {}",
                self.format,
                self.width,
                self.height,
                needed,
                self.data.len()
            ));
        }
        Ok(())
    }

    fn overwrite_from(&mut self, src: &Self) {
        self.width = src.width;
        self.height = src.height;
        self.stride = src.stride;
        self.format = src.format;
        self.frame_number = src.frame_number;
        self.exposure_ns = src.exposure_ns;
        self.data.clear();
        self.data.extend_from_slice(&src.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_validation() {
        assert!(PointCloud::default().validate().is_err());

        let mut cloud = PointCloud::from_xyz(&[[0.0, 0.0, 1.0], [0.1, 0.0, 1.0]]);
        assert!(cloud.validate().is_ok());

        cloud.num_points = 3;
        assert!(cloud.validate().is_err());
    }

    #[test]
    fn test_color_validation() {
        let mut img = ColorImage {
            width: 4,
            height: 4,
            data: vec![0; 24],
            ..Default::default()
        };
        assert!(img.validate().is_ok());

        img.data.truncate(23);
        assert!(img.validate().is_err());

        img.data = vec![0; 24];
        img.height = 0;
        assert!(img.validate().is_err());

        let rgba = ColorImage {
            width: 2,
            height: 2,
            format: ImageFormat::Rgba8,
            data: vec![0; 16],
            ..Default::default()
        };
        assert!(rgba.validate().is_ok());

        // Stride is a byte pitch: 2 RGBA pixels need at least 8
        let padded = ColorImage {
            stride: 12,
            ..rgba.clone()
        };
        assert!(padded.validate().is_err());
        let padded = ColorImage {
            data: vec![0; 24],
            ..padded
        };
        assert!(padded.validate().is_ok());
        let short = ColorImage {
            stride: 6,
            ..rgba
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_pose_validation() {
        let mut pose = PoseData::default();
        assert!(pose.validate().is_ok());
        pose.translation[1] = f64::NAN;
        assert!(pose.validate().is_err());
    }

    #[test]
    fn test_overwrite_keeps_capacity() {
        let mut dst = PointCloud::from_xyz(&[[1.0, 2.0, 3.0]; 100]);
        let cap = dst.points.capacity();
        let src = PointCloud::from_xyz(&[[4.0, 5.0, 6.0]; 10]);

        dst.overwrite_from(&src);
        assert_eq!(dst, src);
        assert_eq!(dst.points.capacity(), cap);
    }
}
