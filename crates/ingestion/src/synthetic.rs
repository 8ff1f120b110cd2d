//! Synthetic scene used by the mock service

use contracts::{
    ColorImage, CoordinateFrame, ImageFormat, ParcelDescriptor, PointCloud, PoseData, PoseStatus,
};

/// Device pose drifting on a slow circle, yawing with it
pub fn synthetic_pose(t: f64) -> PoseData {
    let angle = 0.2 * t;
    let yaw = 0.1 * angle.sin();
    PoseData {
        rotation: [0.0, (yaw / 2.0).sin(), 0.0, (yaw / 2.0).cos()],
        translation: [0.1 * angle.sin(), 0.0, 0.1 * angle.cos() - 0.1],
        status: PoseStatus::Valid,
        base_frame: CoordinateFrame::StartOfService,
        target_frame: CoordinateFrame::Device,
        confidence: 100,
        accuracy: 0.01,
    }
}

/// A gently rippling wall `depth` meters in front of the depth camera
///
/// Points form a grid covering roughly the color camera's field of view.
pub fn synthetic_cloud(num_points: u32, depth: f32, t: f64) -> PointCloud {
    let n = num_points.max(1) as usize;
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);
    let phase = t as f32;

    let xyz: Vec<[f32; 3]> = (0..n)
        .map(|i| {
            let u = (i % cols) as f32 / cols.max(2).saturating_sub(1) as f32 - 0.5;
            let v = (i / cols) as f32 / rows.max(2).saturating_sub(1) as f32 - 0.5;
            let z = depth + 0.2 * (u * 6.0 + phase).sin() * (v * 4.0).cos();
            [u * 1.2 * z, v * 0.7 * z, z]
        })
        .collect();

    let points: Vec<f32> = bytemuck::cast_slice(&xyz).to_vec();
    PointCloud {
        num_points: n as u32,
        descriptor: ParcelDescriptor {
            size: (points.len() * std::mem::size_of::<f32>()) as i32,
            ..Default::default()
        },
        points,
    }
}

/// NV21 frame: diagonal luma gradient scrolling with the frame number,
/// chroma varying across the image
pub fn synthetic_nv21(width: u32, height: u32, frame_number: i64, exposure_ns: i64) -> ColorImage {
    let (w, h) = (width as usize, height as usize);
    let len = ImageFormat::YCrCb420Sp.required_len(width, height, width);
    let mut data = vec![128u8; len];
    let shift = frame_number as usize * 2;

    for row in 0..h {
        for col in 0..w {
            data[row * w + col] = (16 + (row + col + shift) % 220) as u8;
        }
    }
    let chroma = &mut data[w * h..];
    for row in 0..h.div_ceil(2) {
        for pair in 0..w.div_ceil(2) {
            let i = row * w + pair * 2;
            if i + 1 < chroma.len() {
                chroma[i] = (64 + pair * 128 / w.max(1)) as u8;
                chroma[i + 1] = (64 + row * 256 / h.max(1)) as u8;
            }
        }
    }

    ColorImage {
        width,
        height,
        stride: width,
        format: ImageFormat::YCrCb420Sp,
        frame_number,
        exposure_ns,
        data,
    }
}
