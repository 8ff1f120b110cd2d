//! DataStore - three stream caches behind one facade
//!
//! Producers (the event pump) call `publish_*`; the fusion processor and the
//! threaded recorder read through `latest_point_cloud` / `*_near`. Lookups
//! across streams are independent, there is no cross-stream snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{CacheConfig, ColorImage, PointCloud, PoseData, Sample, DEFAULT_CACHE_CAPACITY};
use tracing::debug;

use crate::{CachePayload, Result, TimestampCache};

/// Per-stream cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub pose_occupied: usize,
    pub point_cloud_occupied: usize,
    pub color_occupied: usize,
    pub tracking_epoch: u64,
}

/// Sample store facade
#[derive(Debug)]
pub struct DataStore {
    pose: TimestampCache<PoseData>,
    point_cloud: TimestampCache<PointCloud>,
    color: TimestampCache<ColorImage>,
    /// Bumped on every tracking-lost report
    tracking_epoch: AtomicU64,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl DataStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            pose: TimestampCache::new(config.pose_capacity),
            point_cloud: TimestampCache::new(config.point_cloud_capacity),
            color: TimestampCache::new(config.color_capacity),
            tracking_epoch: AtomicU64::new(0),
        }
    }

    /// Same capacity for every stream
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(&CacheConfig {
            pose_capacity: capacity,
            point_cloud_capacity: capacity,
            color_capacity: capacity,
        })
    }

    // ===== Producer side =====

    pub fn publish_pose(&self, timestamp: f64, pose: &PoseData) -> Result<usize> {
        publish_into(&self.pose, timestamp, pose)
    }

    pub fn publish_point_cloud(&self, timestamp: f64, cloud: &PointCloud) -> Result<usize> {
        publish_into(&self.point_cloud, timestamp, cloud)
    }

    pub fn publish_color_frame(&self, timestamp: f64, image: &ColorImage) -> Result<usize> {
        publish_into(&self.color, timestamp, image)
    }

    /// Tracking reported lost; consumers holding derived state must refresh it
    pub fn mark_tracking_lost(&self) {
        let epoch = self.tracking_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(epoch, "tracking lost");
    }

    // ===== Consumer side =====

    pub fn latest_point_cloud(&self) -> Option<Sample<PointCloud>> {
        self.point_cloud.latest().into_valid()
    }

    pub fn pose_near(&self, timestamp: f64) -> Option<Sample<PoseData>> {
        self.pose.consume(timestamp).into_valid()
    }

    pub fn color_frame_near(&self, timestamp: f64) -> Option<Sample<ColorImage>> {
        self.color.consume(timestamp).into_valid()
    }

    #[inline]
    pub fn tracking_epoch(&self) -> u64 {
        self.tracking_epoch.load(Ordering::Acquire)
    }

    // ===== Diagnostics =====

    pub fn pose_cache(&self) -> &TimestampCache<PoseData> {
        &self.pose
    }

    pub fn point_cloud_cache(&self) -> &TimestampCache<PointCloud> {
        &self.point_cloud
    }

    pub fn color_cache(&self) -> &TimestampCache<ColorImage> {
        &self.color
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            pose_occupied: self.pose.occupied(),
            point_cloud_occupied: self.point_cloud.occupied(),
            color_occupied: self.color.occupied(),
            tracking_epoch: self.tracking_epoch(),
        }
    }
}

fn publish_into<T: CachePayload>(
    cache: &TimestampCache<T>,
    timestamp: f64,
    payload: &T,
) -> Result<usize> {
    match cache.publish(timestamp, payload) {
        Ok(slot) => {
            observability::record_sample_published(T::STREAM);
            Ok(slot)
        }
        Err(e) => {
            debug!(stream = T::STREAM, timestamp, error = %e, "sample rejected");
            observability::record_sample_rejected(T::STREAM);
            Err(e)
        }
    }
}
