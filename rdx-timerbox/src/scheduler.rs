//! Repeating-task scheduling and the monotonic time source controllers read.
//!
//! Controllers never talk to a runtime directly. They receive a [`Scheduler`]
//! to register repeating callbacks with and a [`TimeSource`] to sample
//! monotonic time from. Two implementations are provided:
//!
//! - [`TokioScheduler`] / [`TokioTime`]: one tokio task per repeating callback,
//!   used by the binaries.
//! - [`ManualScheduler`]: a virtual clock that only moves when told to, used
//!   for simulation and deterministic tests.

use crate::common::TaskHandle;
use slotmap::SlotMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// A callback invoked on a fixed period until cancelled.
pub type RepeatingTask = Box<dyn FnMut() + Send + Sync>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Registers and cancels repeating tasks.
///
/// The first invocation happens one full `interval` after scheduling, never
/// immediately. Cancellation takes effect before the next invocation.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run every `interval`. Zero intervals are clamped to 1ms.
    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle;

    /// Cancels a task. Returns `true` if the handle referred to a live task.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

/// A monotonic clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reads tokio's clock, which follows paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTime;

impl TimeSource for TokioTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Runs each repeating task on its own tokio task.
pub struct TokioScheduler {
    runtime: Handle,
    tasks: Mutex<SlotMap<TaskHandle, Option<AbortHandle>>>,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the current tokio runtime.
    ///
    /// Fails when called outside of a runtime context.
    pub fn new() -> anyhow::Result<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self {
            runtime,
            tasks: Mutex::new(SlotMap::with_key()),
        })
    }

    /// Number of tasks that have been scheduled and not cancelled.
    pub fn active_tasks(&self) -> usize {
        lock(&self.tasks).len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: RepeatingTask) -> TaskHandle {
        let period = interval.max(MIN_INTERVAL);
        let mut tasks = lock(&self.tasks);
        let handle = tasks.insert(None);
        let join = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                trace!(?handle, "Repeating task fired.");
                task();
            }
        });
        if let Some(slot) = tasks.get_mut(handle) {
            *slot = Some(join.abort_handle());
        }
        debug!(?handle, ?period, "Scheduled repeating task.");
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        match lock(&self.tasks).remove(handle) {
            Some(abort) => {
                if let Some(abort) = abort {
                    abort.abort();
                }
                debug!(?handle, "Cancelled repeating task.");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.tasks).drain() {
            if let Some(abort) = abort {
                abort.abort();
            }
        }
    }
}

struct ManualTask {
    interval: Duration,
    next_due: Duration,
    callback: Option<RepeatingTask>,
}

struct ManualState {
    elapsed: Duration,
    tasks: SlotMap<TaskHandle, ManualTask>,
}

/// A virtual clock and scheduler that only advances when [`advance`](Self::advance) is called.
///
/// Implements both [`Scheduler`] and [`TimeSource`]; `now()` is the
/// construction instant plus all time advanced so far. Callbacks run
/// synchronously inside `advance`, in deadline order, and may schedule or
/// cancel tasks (including themselves).
pub struct ManualScheduler {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                tasks: SlotMap::with_key(),
            }),
        }
    }

    /// Virtual time advanced since construction.
    pub fn elapsed(&self) -> Duration {
        lock(&self.state).elapsed
    }

    /// Number of tasks that have been scheduled and not cancelled.
    pub fn active_tasks(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    /// Moves virtual time forward by `by`, firing every task that falls due.
    ///
    /// A task due exactly at the new time fires. The lock is released while a
    /// callback runs.
    pub fn advance(&self, by: Duration) {
        let target = lock(&self.state).elapsed + by;
        loop {
            let (handle, mut callback) = {
                let mut state = lock(&self.state);
                let due = state
                    .tasks
                    .iter()
                    .filter(|(_, task)| task.callback.is_some() && task.next_due <= target)
                    .min_by_key(|(_, task)| task.next_due)
                    .map(|(handle, _)| handle);
                let Some(handle) = due else {
                    state.elapsed = target;
                    return;
                };
                let Some(task) = state.tasks.get_mut(handle) else {
                    return;
                };
                let fired_at = task.next_due;
                task.next_due += task.interval;
                let callback = task.callback.take();
                state.elapsed = state.elapsed.max(fired_at);
                match callback {
                    Some(callback) => (handle, callback),
                    None => continue,
                }
            };

            callback();

            if let Some(task) = lock(&self.state).tasks.get_mut(handle) {
                task.callback = Some(callback);
            }
        }
    }
}

impl TimeSource for ManualScheduler {
    fn now(&self) -> Instant {
        self.origin + lock(&self.state).elapsed
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
        let interval = interval.max(MIN_INTERVAL);
        let mut state = lock(&self.state);
        let next_due = state.elapsed + interval;
        state.tasks.insert(ManualTask {
            interval,
            next_due,
            callback: Some(task),
        })
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        lock(&self.state).tasks.remove(handle).is_some()
    }
}
