//! Drainable fault queue

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

/// Default number of faults retained before the oldest is discarded
pub const DEFAULT_FAULT_CAPACITY: usize = 256;

/// Bounded queue of reportable faults
///
/// Producers `push` from any thread; a monitor periodically `drain`s and
/// surfaces them. When full, the oldest fault is discarded.
pub struct FaultQueue<E> {
    faults: Mutex<HeapRb<E>>,
    total: AtomicU64,
}

impl<E> std::fmt::Debug for FaultQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let faults = self.faults.lock();
        f.debug_struct("FaultQueue")
            .field("len", &faults.occupied_len())
            .field("capacity", &faults.capacity())
            .field("total", &self.total())
            .finish()
    }
}

impl<E> Default for FaultQueue<E> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FAULT_CAPACITY)
    }
}

impl<E> FaultQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            faults: Mutex::new(HeapRb::new(capacity.max(1))),
            total: AtomicU64::new(0),
        }
    }

    pub fn push(&self, fault: E) {
        let mut faults = self.faults.lock();
        // Full: discard the oldest
        if faults.is_full() {
            let _ = faults.try_pop();
        }
        let _ = faults.try_push(fault);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Take every queued fault, oldest first
    pub fn drain(&self) -> Vec<E> {
        self.faults.lock().pop_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.faults.lock().occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.faults.lock().capacity().get()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.lock().is_empty()
    }

    /// Faults pushed since construction, including drained and discarded ones
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}
