//! Fixed-capacity timestamp-indexed sample cache.
//!
//! Slot reuse works without a free list:
//! - `consume` moves a sample out and leaves the tombstone (timestamp 0) behind
//! - `publish` overwrites the slot whose timestamp is closest to 0
//!
//! so a just-consumed slot is reclaimed first, otherwise the oldest sample is
//! overwritten. Ties (several slots at 0) go to the first slot in scan order.

use std::fmt;

use contracts::{is_valid_timestamp, Sample};
use parking_lot::Mutex;

use crate::{CacheError, CachePayload, Result};

/// Timestamp-indexed sample cache for one stream
///
/// Every operation is one short critical section under the cache mutex.
pub struct TimestampCache<T: CachePayload> {
    slots: Mutex<Vec<Sample<T>>>,
}

impl<T: CachePayload> fmt::Debug for TimestampCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampCache")
            .field("stream", &T::STREAM)
            .field("slots", &self.slot_timestamps())
            .finish()
    }
}

impl<T: CachePayload> TimestampCache<T> {
    /// Create a cache with `capacity` tombstone slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity.max(1)).map(|_| Sample::empty()).collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    /// Publish a copy of `payload` at `timestamp`
    ///
    /// Returns the reclaimed slot index. Nothing is mutated on error.
    pub fn publish(&self, timestamp: f64, payload: &T) -> Result<usize> {
        if !is_valid_timestamp(timestamp) {
            return Err(CacheError::invalid(
                T::STREAM,
                format!("timestamp {timestamp} is NaN or negative"),
            ));
        }
        payload
            .validate()
            .map_err(|reason| CacheError::invalid(T::STREAM, reason))?;

        let mut slots = self.slots.lock();
        let index = reclaim_slot(&slots);
        let slot = &mut slots[index];
        slot.payload.overwrite_from(payload);
        slot.timestamp = timestamp;
        slot.valid = true;
        Ok(index)
    }

    /// Move out the valid sample nearest to `target` and reset its slot
    ///
    /// Returns the tombstone when no valid sample is cached or `target` is NaN.
    pub fn consume(&self, target: f64) -> Sample<T> {
        let mut slots = self.slots.lock();
        match nearest_slot(&slots, target) {
            Some(index) => std::mem::take(&mut slots[index]),
            None => Sample::empty(),
        }
    }

    /// Newest valid sample, i.e. `consume(+inf)`
    #[inline]
    pub fn latest(&self) -> Sample<T> {
        self.consume(f64::INFINITY)
    }

    /// Slot timestamps in slot order (tombstones read 0)
    pub fn slot_timestamps(&self) -> Vec<f64> {
        self.slots.lock().iter().map(|s| s.timestamp).collect()
    }

    /// Number of slots holding a valid sample
    pub fn occupied(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.valid).count()
    }
}

/// Slot whose timestamp is closest to 0, first one on ties
fn reclaim_slot<T>(slots: &[Sample<T>]) -> usize {
    let mut best = 0;
    for (i, slot) in slots.iter().enumerate().skip(1) {
        if slot.timestamp.abs() < slots[best].timestamp.abs() {
            best = i;
        }
    }
    best
}

/// Valid slot nearest to `target`, first one on ties
fn nearest_slot<T>(slots: &[Sample<T>], target: f64) -> Option<usize> {
    if target.is_nan() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, slot) in slots.iter().enumerate().filter(|(_, s)| s.valid) {
        // +inf: every distance is inf, rank by recency instead
        let distance = if target == f64::INFINITY {
            -slot.timestamp
        } else {
            (slot.timestamp - target).abs()
        };
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ColorImage, PointCloud, PoseData, PoseStatus};

    fn make_cloud(seed: f32, n: usize) -> PointCloud {
        let points: Vec<[f32; 3]> = (0..n)
            .map(|i| [seed + i as f32, -seed, 1.0 + i as f32 * 0.01])
            .collect();
        PointCloud::from_xyz(&points)
    }

    fn make_pose(x: f64) -> PoseData {
        PoseData {
            translation: [x, 0.0, 0.0],
            status: PoseStatus::Valid,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_cache_is_all_tombstones() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(7);
        assert_eq!(cache.capacity(), 7);
        assert_eq!(cache.occupied(), 0);
        assert_eq!(cache.slot_timestamps(), vec![0.0; 7]);

        let s = cache.latest();
        assert!(!s.valid);
        assert_eq!(s.timestamp, 0.0);
    }

    #[test]
    fn test_reject_invalid_leaves_state() {
        let cache: TimestampCache<PointCloud> = TimestampCache::new(3);
        cache.publish(1.0, &make_cloud(1.0, 4)).unwrap();
        let before = cache.slot_timestamps();

        for ts in [f64::NAN, -1.0, f64::NEG_INFINITY] {
            let err = cache.publish(ts, &make_cloud(2.0, 4)).unwrap_err();
            assert!(matches!(err, CacheError::InvalidSample { stream: "point_cloud", .. }));
        }
        assert!(cache.publish(2.0, &PointCloud::default()).is_err());

        assert_eq!(cache.slot_timestamps(), before);
        assert_eq!(cache.occupied(), 1);
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let cache: TimestampCache<ColorImage> = TimestampCache::new(7);
        let img = ColorImage {
            width: 4,
            height: 2,
            stride: 4,
            frame_number: 42,
            exposure_ns: 33_000_000,
            data: (0..12u8).collect(),
            ..Default::default()
        };
        cache.publish(5.25, &img).unwrap();

        let out = cache.consume(5.25);
        assert!(out.valid);
        assert_eq!(out.timestamp, 5.25);
        assert_eq!(out.payload, img);
    }

    #[test]
    fn test_consume_resets_slot_to_tombstone() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(4);
        cache.publish(1.0, &make_pose(1.0)).unwrap();
        let slot = cache.publish(2.0, &make_pose(2.0)).unwrap();

        let out = cache.consume(2.1);
        assert_eq!(out.timestamp, 2.0);
        assert_eq!(cache.slot_timestamps()[slot], 0.0);

        // Consumed twice: second one falls back to the other sample
        assert_eq!(cache.consume(2.1).timestamp, 1.0);
        assert!(!cache.consume(2.1).valid);
    }

    #[test]
    fn test_consumed_slot_is_reclaimed_first() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(3);
        for (i, ts) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            assert_eq!(cache.publish(ts, &make_pose(ts)).unwrap(), i);
        }

        // Slot 1 becomes the only timestamp-0 slot
        assert_eq!(cache.consume(2.0).timestamp, 2.0);
        assert_eq!(cache.publish(10.0, &make_pose(10.0)).unwrap(), 1);
        assert_eq!(cache.slot_timestamps(), vec![1.0, 10.0, 3.0]);
    }

    #[test]
    fn test_capacity_overwrites_oldest() {
        let n = 7;
        let cache: TimestampCache<PoseData> = TimestampCache::new(n);
        for i in 1..=n + 1 {
            cache.publish(i as f64, &make_pose(i as f64)).unwrap();
        }

        assert_eq!(cache.occupied(), n);
        assert!(!cache.slot_timestamps().contains(&1.0));

        for i in 2..=n + 1 {
            let s = cache.consume(i as f64);
            assert!(s.valid);
            assert_eq!(s.timestamp, i as f64);
            assert_eq!(s.payload.translation[0], i as f64);
        }
        assert_eq!(cache.occupied(), 0);
    }

    #[test]
    fn test_tie_break_first_in_scan_order() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(4);
        // All tombstones: first slot wins
        assert_eq!(cache.publish(1.0, &make_pose(1.0)).unwrap(), 0);
        assert_eq!(cache.publish(1.0, &make_pose(1.5)).unwrap(), 1);

        // Equal distance from 1.0: first slot in scan order wins
        let s = cache.consume(1.0);
        assert_eq!(s.payload.translation[0], 1.0);
    }

    #[test]
    fn test_latest_picks_largest_timestamp() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(5);
        for ts in [3.0, 9.0, 1.0, 4.0] {
            cache.publish(ts, &make_pose(ts)).unwrap();
        }
        assert_eq!(cache.latest().timestamp, 9.0);
        assert_eq!(cache.latest().timestamp, 4.0);
    }

    #[test]
    fn test_nearest_skips_tombstones() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(4);
        cache.publish(5.0, &make_pose(5.0)).unwrap();
        // Tombstones sit at 0 and would be nearer to 0.1
        let s = cache.consume(0.1);
        assert!(s.valid);
        assert_eq!(s.timestamp, 5.0);
    }

    #[test]
    fn test_nan_target_returns_tombstone() {
        let cache: TimestampCache<PoseData> = TimestampCache::new(2);
        cache.publish(5.0, &make_pose(5.0)).unwrap();
        assert!(!cache.consume(f64::NAN).valid);
        assert_eq!(cache.occupied(), 1);
    }

    #[test]
    fn test_concurrent_publish_consume() {
        use std::sync::Arc;
        use std::thread;

        let cache: Arc<TimestampCache<PointCloud>> = Arc::new(TimestampCache::new(7));
        let producer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 1..=500 {
                    cache.publish(i as f64, &make_cloud(i as f32, 8)).unwrap();
                }
            })
        };

        let mut seen = 0;
        for _ in 0..500 {
            let s = cache.latest();
            if s.valid {
                assert_eq!(s.payload.num_points, 8);
                assert_eq!(s.payload.points[0], s.timestamp as f32);
                seen += 1;
            }
        }
        producer.join().unwrap();
        assert!(seen + cache.occupied() > 0);
        assert!(cache.capacity() == 7);
    }
}
