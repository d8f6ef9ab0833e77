//! Defines all public event types published by the Timerbox controllers.
//!
//! This module is the contract between the controllers and whatever renders
//! them. Each controller pushes these strongly-typed events through a
//! [`Publisher`](crate::common::Publisher); the [`UiBinder`](crate::binder::UiBinder)
//! turns them into display-slot writes.

use std::time::Duration;

/// A snapshot of wall-clock time, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    /// `HH:MM:SS`, 24-hour.
    pub time: String,
    /// Long-form date, formatted with the configured pattern.
    pub date: String,
}

/// A lap snapshot: total elapsed stopwatch time when the lap was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap(pub Duration);

/// Events related to the stopwatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopwatchEvent {
    /// Fired when the stopwatch starts or resumes.
    Started { elapsed: Duration },
    /// Fired on every render tick while running.
    Tick { elapsed: Duration },
    /// Fired when a running stopwatch is paused.
    Paused { elapsed: Duration },
    /// Fired when the stopwatch is reset to zero and its laps are cleared.
    Reset,
    /// Fired when a lap is recorded. Laps are ordered newest first.
    LapRecorded { laps: Vec<Lap> },
}

/// Events related to the countdown timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Fired when a preset starts a new countdown.
    Started { minutes: u32, duration: Duration },
    /// Fired on every tick while running.
    Tick { remaining: Duration, duration: Duration },
    /// Fired when a running countdown is paused. `remaining` is frozen.
    Paused { remaining: Duration },
    /// Fired when a paused countdown resumes.
    Resumed { remaining: Duration },
    /// Fired when the countdown reaches zero on its own.
    Finished,
    /// Fired when a running or paused countdown is cancelled by the user.
    Cancelled,
}
