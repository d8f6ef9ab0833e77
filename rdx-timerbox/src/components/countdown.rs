//! The countdown controller: preset-driven timers with pause, resume and cancel.

use crate::common::{Publisher, TaskHandle};
use crate::events::CountdownEvent;
use crate::scheduler::{Scheduler, TimeSource};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// The countdown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    Idle,
    /// Counting down towards `ends_at`.
    Running { ends_at: Instant },
    /// Frozen with `remaining` left on the clock.
    Paused { remaining: Duration },
}

impl fmt::Display for CountdownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CountdownPhase::Idle => "Idle",
            CountdownPhase::Running { .. } => "Running",
            CountdownPhase::Paused { .. } => "Paused",
        })
    }
}

struct CountdownState {
    phase: CountdownPhase,
    duration: Duration,
    tick_task: Option<TaskHandle>,
    /// Bumped whenever the tick task goes away; ticks from an older task are ignored.
    epoch: u64,
}

impl CountdownState {
    fn remaining(&self, now: Instant) -> Duration {
        match self.phase {
            CountdownPhase::Idle => Duration::ZERO,
            CountdownPhase::Running { ends_at } => ends_at.saturating_duration_since(now),
            CountdownPhase::Paused { remaining } => remaining,
        }
    }
}

struct Shared {
    /// Held across a state change and its publication, so the publisher sees
    /// events in the order the state changed.
    transition: Mutex<()>,
    state: Mutex<CountdownState>,
    scheduler: Arc<dyn Scheduler>,
    time: Arc<dyn TimeSource>,
    publisher: Publisher<CountdownEvent>,
    tick_interval: Duration,
}

impl Shared {
    fn begin(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, CountdownState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_ticks(self: &Arc<Self>, state: &mut CountdownState) {
        self.cancel_ticks(state);
        let epoch = state.epoch;
        let weak: Weak<Shared> = Arc::downgrade(self);
        let handle = self.scheduler.schedule_repeating(
            self.tick_interval,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick(epoch);
                }
            }),
        );
        state.tick_task = Some(handle);
    }

    fn cancel_ticks(&self, state: &mut CountdownState) {
        if let Some(handle) = state.tick_task.take() {
            self.scheduler.cancel(handle);
        }
        state.epoch = state.epoch.wrapping_add(1);
    }

    fn go_idle(&self, state: &mut CountdownState) {
        state.phase = CountdownPhase::Idle;
        state.duration = Duration::ZERO;
        self.cancel_ticks(state);
    }

    /// Samples the remaining time; reaching zero finishes the countdown in the
    /// same critical section.
    fn tick(&self, epoch: u64) {
        let _transition = self.begin();
        let (remaining, duration, finished) = {
            let mut state = self.lock();
            if state.epoch != epoch || !matches!(state.phase, CountdownPhase::Running { .. }) {
                return;
            }
            let remaining = state.remaining(self.time.now());
            let duration = state.duration;
            let finished = remaining.is_zero();
            if finished {
                self.go_idle(&mut state);
            }
            (remaining, duration, finished)
        };
        (self.publisher)(&CountdownEvent::Tick {
            remaining,
            duration,
        });
        if finished {
            info!("Countdown finished.");
            (self.publisher)(&CountdownEvent::Finished);
        }
    }
}

/// Counts down from a preset number of minutes.
///
/// While running, a repeating task samples the remaining time every
/// `tick_interval` and stops the countdown when it reaches zero. Pausing
/// cancels the task and resuming schedules a fresh one, so at most one tick
/// task exists at a time. Cloning yields another handle to the same countdown.
///
/// The publisher may read the countdown but must not drive it.
#[derive(Clone)]
pub struct Countdown {
    shared: Arc<Shared>,
}

impl Countdown {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        time: Arc<dyn TimeSource>,
        publisher: Publisher<CountdownEvent>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transition: Mutex::new(()),
                state: Mutex::new(CountdownState {
                    phase: CountdownPhase::Idle,
                    duration: Duration::ZERO,
                    tick_task: None,
                    epoch: 0,
                }),
                scheduler,
                time,
                publisher,
                tick_interval,
            }),
        }
    }

    /// Starts a fresh countdown of `minutes`, replacing any countdown in progress.
    ///
    /// A zero-minute preset is ignored.
    pub fn start_preset(&self, minutes: u32) {
        if minutes == 0 {
            debug!("Ignoring zero-minute preset.");
            return;
        }
        let duration = Duration::from_secs(u64::from(minutes) * 60);
        let _transition = self.shared.begin();
        {
            let mut state = self.shared.lock();
            state.duration = duration;
            state.phase = CountdownPhase::Running {
                ends_at: self.shared.time.now() + duration,
            };
            self.shared.schedule_ticks(&mut state);
        }
        info!(minutes, "Countdown started.");
        (self.shared.publisher)(&CountdownEvent::Started { minutes, duration });
    }

    /// Pauses a running countdown or resumes a paused one. Does nothing when idle.
    pub fn pause(&self) {
        let _transition = self.shared.begin();
        let event = {
            let mut state = self.shared.lock();
            let now = self.shared.time.now();
            let phase = state.phase;
            match phase {
                CountdownPhase::Idle => return,
                CountdownPhase::Running { ends_at } => {
                    let remaining = ends_at.saturating_duration_since(now);
                    state.phase = CountdownPhase::Paused { remaining };
                    self.shared.cancel_ticks(&mut state);
                    CountdownEvent::Paused { remaining }
                }
                CountdownPhase::Paused { remaining } => {
                    state.phase = CountdownPhase::Running {
                        ends_at: now + remaining,
                    };
                    self.shared.schedule_ticks(&mut state);
                    CountdownEvent::Resumed { remaining }
                }
            }
        };
        debug!(?event, "Countdown toggled.");
        (self.shared.publisher)(&event);
    }

    /// Cancels a running or paused countdown. Does nothing when idle.
    pub fn cancel(&self) {
        let _transition = self.shared.begin();
        {
            let mut state = self.shared.lock();
            if state.phase == CountdownPhase::Idle {
                return;
            }
            self.shared.go_idle(&mut state);
        }
        info!("Countdown cancelled.");
        (self.shared.publisher)(&CountdownEvent::Cancelled);
    }

    pub fn phase(&self) -> CountdownPhase {
        self.shared.lock().phase
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase(), CountdownPhase::Paused { .. })
    }

    /// Remaining time: live while running, frozen while paused, zero when idle.
    pub fn remaining(&self) -> Duration {
        self.shared.lock().remaining(self.shared.time.now())
    }

    /// Length of the current countdown, zero when idle.
    pub fn duration(&self) -> Duration {
        self.shared.lock().duration
    }
}
