//! # Scheduler
//!
//! Thread-level building blocks shared by the capture loops:
//!
//! - [`Lifecycle`]: `Idle → Running → Stopping → Stopped` with compare-and-set transitions
//! - [`PeriodicTask`]: fixed-delay (fusion, recording, preview) or fixed-rate (mock streams)
//!   loop on a named OS thread
//! - [`FaultQueue`]: bounded, drainable queue of reportable faults
//!
//! ## 使用示例
//!
//! ```ignore
//! use std::ops::ControlFlow;
//! use scheduler::PeriodicTask;
//!
//! let task = PeriodicTask::spawn("fusion", Duration::from_millis(30), move || {
//!     processor.run_cycle();
//!     ControlFlow::Continue(())
//! })?;
//! // ...
//! task.stop();
//! ```

mod error;
mod fault;
mod lifecycle;
mod periodic;

pub use error::{Result, SchedulerError};
pub use fault::FaultQueue;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use periodic::{PeriodicTask, Schedule};
