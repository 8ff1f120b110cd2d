//! Scheduler error types

use thiserror::Error;

use crate::LifecycleState;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// OS refused to spawn the worker thread
    #[error("failed to spawn task '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Transition attempted from the wrong state
    #[error("invalid lifecycle transition {from:?} -> {to:?} (current: {current:?})")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
        current: LifecycleState,
    },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
