//! Fixed-delay periodic task on a dedicated thread

use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{Lifecycle, LifecycleState, Result, SchedulerError};

/// How the wait between ticks is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Wait the full interval after each tick finishes
    FixedDelay,
    /// Tick at `start + n * interval`; a late tick runs immediately
    FixedRate,
}

/// Periodic task
///
/// Runs `tick` on a named thread, waiting `interval` between runs according
/// to its [`Schedule`]. The lifecycle is checked at the top of every cycle,
/// so a tick in flight always completes. `stop()` wakes the sleeping thread
/// and joins it.
pub struct PeriodicTask {
    name: String,
    interval: Duration,
    schedule: Schedule,
    lifecycle: Arc<Lifecycle>,
    handle: Mutex<Option<JoinHandle<u64>>>,
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("schedule", &self.schedule)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

impl PeriodicTask {
    /// Spawn and start a fixed-delay task
    ///
    /// Returning `ControlFlow::Break` from `tick` ends the loop after that cycle.
    pub fn spawn<F>(name: impl Into<String>, interval: Duration, tick: F) -> Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        Self::spawn_with(name, interval, Schedule::FixedDelay, tick)
    }

    /// Spawn and start a fixed-rate task (sensor-style producers)
    pub fn spawn_fixed_rate<F>(name: impl Into<String>, interval: Duration, tick: F) -> Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        Self::spawn_with(name, interval, Schedule::FixedRate, tick)
    }

    pub fn spawn_with<F>(
        name: impl Into<String>,
        interval: Duration,
        schedule: Schedule,
        mut tick: F,
    ) -> Result<Self>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let name = name.into();
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.start()?;

        let loop_state = lifecycle.clone();
        let loop_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let mut cycles: u64 = 0;
                let mut next = Instant::now();
                debug!(
                    task = %loop_name,
                    interval_ms = interval.as_millis() as u64,
                    ?schedule,
                    "periodic task started"
                );

                while loop_state.is_running() {
                    let cycle_start = Instant::now();
                    cycles += 1;

                    if tick().is_break() {
                        trace!(task = %loop_name, cycles, "tick requested stop");
                        loop_state.request_stop();
                        break;
                    }

                    let deadline = match schedule {
                        Schedule::FixedDelay => Instant::now() + interval,
                        Schedule::FixedRate => {
                            next += interval;
                            next
                        }
                    };
                    while loop_state.is_running() {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::park_timeout(deadline - now);
                    }

                    trace!(
                        task = %loop_name,
                        cycle_ms = cycle_start.elapsed().as_secs_f64() * 1000.0,
                        "cycle finished"
                    );
                }

                loop_state.mark_stopped();
                debug!(task = %loop_name, cycles, "periodic task stopped");
                cycles
            })
            .map_err(|source| SchedulerError::Spawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            interval,
            schedule,
            lifecycle,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Still looping (not stopping, not stopped)
    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Request stop, wake the thread and join it
    ///
    /// Idempotent. Returns the number of cycles the task ran, or `None` if it
    /// had already been joined.
    pub fn stop(&self) -> Option<u64> {
        self.lifecycle.request_stop();

        let handle = self.handle.lock().take()?;
        handle.thread().unpark();
        match handle.join() {
            Ok(cycles) => Some(cycles),
            Err(_) => {
                warn!(task = %self.name, "periodic task panicked");
                self.lifecycle.mark_stopped();
                None
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
