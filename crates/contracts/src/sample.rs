//! Sample - 带时间戳的传感器数据单元
//!
//! ## Time Model
//! - `timestamp` is seconds on the sensing service clock
//! - never NaN, never negative; the empty sample (tombstone) carries 0

use serde::{Deserialize, Serialize};

/// One timestamped unit of sensor payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub timestamp: f64,
    pub payload: T,
    pub valid: bool,
}

impl<T> Sample<T> {
    /// Valid sample
    pub fn new(timestamp: f64, payload: T) -> Self {
        Self {
            timestamp,
            payload,
            valid: true,
        }
    }

    /// Map the payload, keeping timestamp and validity
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sample<U> {
        Sample {
            timestamp: self.timestamp,
            payload: f(self.payload),
            valid: self.valid,
        }
    }

    /// `None` for the tombstone
    pub fn into_valid(self) -> Option<Self> {
        self.valid.then_some(self)
    }
}

impl<T: Default> Sample<T> {
    /// Empty sample: timestamp 0, default payload, `valid == false`
    pub fn empty() -> Self {
        Self {
            timestamp: 0.0,
            payload: T::default(),
            valid: false,
        }
    }
}

impl<T: Default> Default for Sample<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Check the timestamp invariant shared by every stream
#[inline]
pub fn is_valid_timestamp(timestamp: f64) -> bool {
    !timestamp.is_nan() && timestamp >= 0.0
}
