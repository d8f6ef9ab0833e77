//! The stopwatch controller: elapsed-time bookkeeping, laps and a render task.

use crate::common::{Publisher, TaskHandle};
use crate::events::{Lap, StopwatchEvent};
use crate::scheduler::{Scheduler, TimeSource};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// The user-visible state of the stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopwatchStatus {
    /// Never started since construction or the last reset.
    #[default]
    Idle,
    Running,
    /// Stopped by a pause, even one at zero elapsed.
    Paused,
}

impl fmt::Display for StopwatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopwatchStatus::Idle => "Idle",
            StopwatchStatus::Running => "Running",
            StopwatchStatus::Paused => "Paused",
        })
    }
}

#[derive(Default)]
struct StopwatchState {
    status: StopwatchStatus,
    started_at: Option<Instant>,
    accumulated: Duration,
    laps: Vec<Lap>,
    render_task: Option<TaskHandle>,
    /// Bumped whenever the render task goes away; renders from an older task are ignored.
    epoch: u64,
}

impl StopwatchState {
    fn running(&self) -> bool {
        self.status == StopwatchStatus::Running
    }

    fn elapsed(&self, now: Instant) -> Duration {
        match (self.running(), self.started_at) {
            (true, Some(started_at)) => {
                self.accumulated + now.saturating_duration_since(started_at)
            }
            _ => self.accumulated,
        }
    }
}

struct Shared {
    /// Held across a state change and its publication, so a render tick can
    /// never land after the pause or reset that stopped it.
    transition: Mutex<()>,
    state: Mutex<StopwatchState>,
    scheduler: Arc<dyn Scheduler>,
    time: Arc<dyn TimeSource>,
    publisher: Publisher<StopwatchEvent>,
    render_interval: Duration,
    max_laps: usize,
}

impl Shared {
    fn begin(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, StopwatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render_tick(&self, epoch: u64) {
        let _transition = self.begin();
        let elapsed = {
            let state = self.lock();
            if state.epoch != epoch || !state.running() {
                return;
            }
            state.elapsed(self.time.now())
        };
        (self.publisher)(&StopwatchEvent::Tick { elapsed });
    }

    fn cancel_render_task(&self, state: &mut StopwatchState) {
        if let Some(handle) = state.render_task.take() {
            self.scheduler.cancel(handle);
        }
        state.epoch = state.epoch.wrapping_add(1);
    }
}

/// Tracks elapsed time across running segments and keeps the most recent laps.
///
/// While running, a repeating task republishes the elapsed time every
/// `render_interval`. The task is cancelled whenever the stopwatch stops, so
/// at most one render task exists at a time. Cloning yields another handle
/// to the same stopwatch. The publisher may read the stopwatch but must not
/// drive it.
#[derive(Clone)]
pub struct Stopwatch {
    shared: Arc<Shared>,
}

impl Stopwatch {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        time: Arc<dyn TimeSource>,
        publisher: Publisher<StopwatchEvent>,
        render_interval: Duration,
        max_laps: usize,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transition: Mutex::new(()),
                state: Mutex::new(StopwatchState::default()),
                scheduler,
                time,
                publisher,
                render_interval,
                max_laps: max_laps.max(1),
            }),
        }
    }

    /// Starts or resumes the stopwatch. Does nothing if already running.
    pub fn start(&self) {
        let _transition = self.shared.begin();
        let elapsed = {
            let mut state = self.shared.lock();
            if state.running() {
                return;
            }
            state.status = StopwatchStatus::Running;
            state.started_at = Some(self.shared.time.now());
            self.shared.cancel_render_task(&mut state);
            let epoch = state.epoch;
            let weak: Weak<Shared> = Arc::downgrade(&self.shared);
            let handle = self.shared.scheduler.schedule_repeating(
                self.shared.render_interval,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.render_tick(epoch);
                    }
                }),
            );
            state.render_task = Some(handle);
            state.accumulated
        };
        debug!(?elapsed, "Stopwatch started.");
        (self.shared.publisher)(&StopwatchEvent::Started { elapsed });
    }

    /// Banks the running segment and stops. Does nothing if not running.
    pub fn pause(&self) {
        let _transition = self.shared.begin();
        let elapsed = {
            let mut state = self.shared.lock();
            if !state.running() {
                return;
            }
            state.accumulated = state.elapsed(self.shared.time.now());
            state.status = StopwatchStatus::Paused;
            state.started_at = None;
            self.shared.cancel_render_task(&mut state);
            state.accumulated
        };
        debug!(?elapsed, "Stopwatch paused.");
        (self.shared.publisher)(&StopwatchEvent::Paused { elapsed });
    }

    /// Stops the stopwatch, zeroes it and clears all laps.
    pub fn reset(&self) {
        let _transition = self.shared.begin();
        {
            let mut state = self.shared.lock();
            state.status = StopwatchStatus::Idle;
            state.started_at = None;
            state.accumulated = Duration::ZERO;
            state.laps.clear();
            self.shared.cancel_render_task(&mut state);
        }
        debug!("Stopwatch reset.");
        (self.shared.publisher)(&StopwatchEvent::Reset);
    }

    /// Records the current elapsed time as a lap. Does nothing at zero elapsed.
    ///
    /// Laps are kept newest first and truncated to the configured maximum.
    pub fn lap(&self) {
        let _transition = self.shared.begin();
        let laps = {
            let mut state = self.shared.lock();
            let elapsed = state.elapsed(self.shared.time.now());
            if elapsed.is_zero() {
                return;
            }
            state.laps.insert(0, Lap(elapsed));
            state.laps.truncate(self.shared.max_laps);
            state.laps.clone()
        };
        debug!(count = laps.len(), "Stopwatch lap recorded.");
        (self.shared.publisher)(&StopwatchEvent::LapRecorded { laps });
    }

    /// The single start control: pauses when running, otherwise starts or resumes.
    pub fn toggle(&self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running()
    }

    /// Accumulated time plus the live segment if running.
    pub fn elapsed(&self) -> Duration {
        self.shared.lock().elapsed(self.shared.time.now())
    }

    /// Retained laps, newest first.
    pub fn laps(&self) -> Vec<Lap> {
        self.shared.lock().laps.clone()
    }

    /// Matches the last status event published.
    pub fn status(&self) -> StopwatchStatus {
        self.shared.lock().status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    struct Fixture {
        clock: Arc<ManualScheduler>,
        stopwatch: Stopwatch,
        events: Arc<Mutex<Vec<StopwatchEvent>>>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualScheduler::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let stopwatch = Stopwatch::new(
            clock.clone(),
            clock.clone(),
            Arc::new(move |event: &StopwatchEvent| sink.lock().unwrap().push(event.clone())),
            Duration::from_millis(100),
            3,
        );
        Fixture {
            clock,
            stopwatch,
            events,
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn lap_after_running_captures_elapsed() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(1_500));
        f.stopwatch.lap();

        assert_eq!(f.stopwatch.elapsed(), ms(1_500));
        assert_eq!(f.stopwatch.laps(), vec![Lap(ms(1_500))]);
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Running);
    }

    #[test]
    fn running_stopwatch_publishes_ticks() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(300));

        let events = f.events.lock().unwrap();
        assert_eq!(events[0], StopwatchEvent::Started { elapsed: Duration::ZERO });
        assert_eq!(
            &events[1..],
            &[
                StopwatchEvent::Tick { elapsed: ms(100) },
                StopwatchEvent::Tick { elapsed: ms(200) },
                StopwatchEvent::Tick { elapsed: ms(300) },
            ]
        );
    }

    #[test]
    fn pause_is_idempotent_and_excludes_paused_time() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(400));
        f.stopwatch.pause();
        let banked = f.stopwatch.elapsed();
        f.clock.advance(ms(5_000));
        f.stopwatch.pause();

        assert_eq!(banked, ms(400));
        assert_eq!(f.stopwatch.elapsed(), ms(400));
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Paused);
        assert_eq!(f.clock.active_tasks(), 0);

        f.stopwatch.start();
        f.clock.advance(ms(100));
        assert_eq!(f.stopwatch.elapsed(), ms(500));
    }

    #[test]
    fn start_twice_keeps_single_render_task() {
        let f = fixture();
        f.stopwatch.start();
        f.stopwatch.start();
        assert_eq!(f.clock.active_tasks(), 1);
        let started = f
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, StopwatchEvent::Started { .. }))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn lap_list_keeps_three_newest() {
        let f = fixture();
        f.stopwatch.start();
        for _ in 0..4 {
            f.clock.advance(ms(1_000));
            f.stopwatch.lap();
        }
        assert_eq!(
            f.stopwatch.laps(),
            vec![Lap(ms(4_000)), Lap(ms(3_000)), Lap(ms(2_000))]
        );
    }

    #[test]
    fn lap_at_zero_is_ignored() {
        let f = fixture();
        f.stopwatch.lap();
        f.stopwatch.start();
        f.stopwatch.lap();
        assert!(f.stopwatch.laps().is_empty());
    }

    #[test]
    fn reset_while_running_returns_to_idle() {
        let f = fixture();
        f.stopwatch.start();
        f.clock.advance(ms(2_300));
        f.stopwatch.lap();
        f.stopwatch.reset();

        assert_eq!(f.stopwatch.status(), StopwatchStatus::Idle);
        assert_eq!(f.stopwatch.elapsed(), Duration::ZERO);
        assert!(f.stopwatch.laps().is_empty());
        assert_eq!(f.clock.active_tasks(), 0);
        assert_eq!(f.events.lock().unwrap().last(), Some(&StopwatchEvent::Reset));

        f.clock.advance(ms(1_000));
        assert_eq!(f.stopwatch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn pause_at_zero_reports_paused() {
        let f = fixture();
        f.stopwatch.start();
        f.stopwatch.pause();

        assert_eq!(f.stopwatch.status(), StopwatchStatus::Paused);
        assert_eq!(
            f.events.lock().unwrap().last(),
            Some(&StopwatchEvent::Paused {
                elapsed: Duration::ZERO
            })
        );
        f.stopwatch.reset();
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Idle);
    }

    #[test]
    fn render_from_cancelled_task_is_ignored() {
        let f = fixture();
        f.stopwatch.start();
        let stale = f.stopwatch.shared.lock().epoch;
        f.clock.advance(ms(250));
        f.stopwatch.pause();
        f.stopwatch.start();
        let published = f.events.lock().unwrap().len();

        f.stopwatch.shared.render_tick(stale);

        assert_eq!(f.events.lock().unwrap().len(), published);
        assert_eq!(f.clock.active_tasks(), 1);
    }

    #[test]
    fn renders_racing_toggles_never_follow_the_pause() {
        let f = fixture();
        let clock = f.clock.clone();
        let driver = std::thread::spawn(move || {
            for _ in 0..200 {
                clock.advance(ms(50));
            }
        });
        for _ in 0..40 {
            f.stopwatch.toggle();
            std::thread::yield_now();
        }
        driver.join().unwrap();

        assert_eq!(f.stopwatch.status(), StopwatchStatus::Paused);
        assert_eq!(f.clock.active_tasks(), 0);
        assert_eq!(
            f.events.lock().unwrap().last(),
            Some(&StopwatchEvent::Paused {
                elapsed: f.stopwatch.elapsed()
            })
        );
    }

    #[test]
    fn toggle_cycles_start_pause_resume() {
        let f = fixture();
        f.stopwatch.toggle();
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Running);
        f.clock.advance(ms(700));
        f.stopwatch.toggle();
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Paused);
        f.stopwatch.toggle();
        assert_eq!(f.stopwatch.status(), StopwatchStatus::Running);
        assert_eq!(
            f.events.lock().unwrap().last(),
            Some(&StopwatchEvent::Started { elapsed: ms(700) })
        );
    }
}
