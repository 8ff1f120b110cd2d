//! Subsystem lifecycle state machine

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{Result, SchedulerError};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// Atomic lifecycle cell
///
/// Every transition is a single compare-and-set; exactly one caller wins each edge.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Idle as u8),
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Compare-and-set `from → to`
    pub fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| SchedulerError::InvalidTransition {
                from,
                to,
                current: LifecycleState::from_u8(current),
            })
    }

    /// `Idle → Running`; a stopped subsystem may also be restarted
    pub fn start(&self) -> Result<()> {
        self.transition(LifecycleState::Idle, LifecycleState::Running)
            .or_else(|_| self.transition(LifecycleState::Stopped, LifecycleState::Running))
    }

    /// `Running → Stopping`. Returns `false` if another caller already won.
    pub fn request_stop(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopping)
            .is_ok()
    }

    /// `Stopping → Stopped`
    pub fn mark_stopped(&self) {
        let _ = self.transition(LifecycleState::Stopping, LifecycleState::Stopped);
    }
}
