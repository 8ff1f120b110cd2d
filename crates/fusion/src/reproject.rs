//! Sparse point cloud → dense depth map at the color resolution

use contracts::{CameraIntrinsics, PointCloud};
use nalgebra::{Isometry3, Point3};

/// Nearest-neighbor depth reprojection
///
/// Each projected point claims every pixel within `splat_radius` whose
/// current claimant is farther away in image space. Pixels nobody claims stay
/// at `+inf` ("too far").
#[derive(Debug, Clone, Default)]
pub struct Reprojector {
    splat_radius: u32,
    /// Squared image distance of each pixel's current claimant
    claim_dist: Vec<f32>,
}

impl Reprojector {
    pub fn new(splat_radius: u32) -> Self {
        Self {
            splat_radius,
            claim_dist: Vec::new(),
        }
    }

    /// Fill `depth` (resized to `k.width * k.height`) and return how many
    /// points landed inside the image
    ///
    /// `color_from_depth` maps depth-camera points into the color camera;
    /// `k` must already be scaled to the output resolution.
    pub fn reproject(
        &mut self,
        cloud: &PointCloud,
        color_from_depth: &Isometry3<f64>,
        k: &CameraIntrinsics,
        depth: &mut Vec<f32>,
    ) -> usize {
        let (w, h) = (k.width as usize, k.height as usize);
        depth.clear();
        depth.resize(w * h, f32::INFINITY);
        self.claim_dist.clear();
        self.claim_dist.resize(w * h, f32::INFINITY);
        if w == 0 || h == 0 {
            return 0;
        }

        // Always reach the nearest pixel center
        let radius = (self.splat_radius as f64).max(std::f64::consts::FRAC_1_SQRT_2);
        let radius2 = radius * radius;
        let mut projected = 0;

        for [x, y, z] in cloud.iter_points() {
            let p = color_from_depth * Point3::new(x as f64, y as f64, z as f64);
            if !(p.z > 0.0) {
                continue;
            }
            let u = k.fx * p.x / p.z + k.cx;
            let v = k.fy * p.y / p.z + k.cy;

            let col_lo = (u - radius).ceil().max(0.0);
            let col_hi = (u + radius).floor().min((w - 1) as f64);
            let row_lo = (v - radius).ceil().max(0.0);
            let row_hi = (v + radius).floor().min((h - 1) as f64);
            if col_lo > col_hi || row_lo > row_hi {
                continue;
            }
            projected += 1;

            let pz = p.z as f32;
            for row in row_lo as usize..=row_hi as usize {
                let dv = row as f64 - v;
                for col in col_lo as usize..=col_hi as usize {
                    let du = col as f64 - u;
                    let d2 = du * du + dv * dv;
                    if d2 > radius2 {
                        continue;
                    }
                    let idx = row * w + col;
                    let d2 = d2 as f32;
                    let best = self.claim_dist[idx];
                    if d2 < best || (d2 == best && pz < depth[idx]) {
                        self.claim_dist[idx] = d2;
                        depth[idx] = pz;
                    }
                }
            }
        }
        projected
    }
}
