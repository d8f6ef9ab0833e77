//! Wires controls to controllers and controller events to display slots.
//!
//! The binder is the only part of the widget that knows about a display. It
//! talks to one through [`RenderSink`], a set of named setters, and receives
//! input as [`Control`] values from whatever front end reads the user.

use crate::common::Publisher;
use crate::components::clock::ClockTicker;
use crate::components::countdown::Countdown;
use crate::components::stopwatch::Stopwatch;
use crate::config::TimerboxConfig;
use crate::events::{ClockFace, CountdownEvent, Lap, StopwatchEvent};
use crate::format::{format_countdown, format_progress, format_stopwatch, progress_fraction};
use crate::scheduler::{Scheduler, TimeSource};
use anyhow::{anyhow, bail};
use rand::seq::SliceRandom;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const NO_LAPS: &str = "No laps yet";
pub const COUNTDOWN_DONE: &str = "Time's up. Nicely done.";
pub const COUNTDOWN_PROMPT: &str = "Tap a preset to start.";

/// Named display slots the widget writes into.
///
/// Every setter defaults to doing nothing, so a surface that lacks a slot
/// simply does not implement it and the update is skipped.
#[allow(unused_variables)]
pub trait RenderSink: Send + Sync {
    fn clock_time(&self, text: &str) {}
    fn clock_date(&self, text: &str) {}
    fn stopwatch_display(&self, text: &str) {}
    fn stopwatch_status(&self, text: &str) {}
    fn stopwatch_laps(&self, text: &str) {}
    /// Label of the start/pause/resume control.
    fn stopwatch_toggle_label(&self, text: &str) {}
    fn countdown_display(&self, text: &str) {}
    fn countdown_status(&self, text: &str) {}
    fn countdown_label(&self, text: &str) {}
    /// Progress bar width, e.g. `42.0%`.
    fn countdown_progress(&self, width: &str) {}
    /// Label of the pause/resume control.
    fn countdown_pause_label(&self, text: &str) {}
    fn footer_hint(&self, text: &str) {}
    fn footer_mode(&self, text: &str) {}
    fn env_label(&self, text: &str) {}
}

/// A user action read from the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The stopwatch start/pause/resume control.
    StopwatchToggle,
    StopwatchLap,
    StopwatchReset,
    /// The countdown pause/resume control.
    CountdownPause,
    CountdownCancel,
    /// A preset control carrying its minutes value.
    Preset(u32),
}

impl FromStr for Control {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let control = match words.as_slice() {
            ["start"] | ["toggle"] | ["resume"] | ["sw", "start"] => Control::StopwatchToggle,
            ["lap"] | ["sw", "lap"] => Control::StopwatchLap,
            ["reset"] | ["sw", "reset"] => Control::StopwatchReset,
            ["pause"] | ["cd", "pause"] => Control::CountdownPause,
            ["cancel"] | ["cd", "cancel"] => Control::CountdownCancel,
            ["preset", minutes] | ["cd", minutes] | [minutes] => {
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| anyhow!("'{minutes}' is not a number of minutes"))?;
                Control::Preset(minutes)
            }
            [] => bail!("empty command"),
            _ => bail!("unknown control '{input}'"),
        };
        Ok(control)
    }
}

/// Formats the lap list as `#3 00:04.0 · #2 00:03.0 · #1 00:02.0`.
///
/// Ordinals count down from the number of retained laps, so they are
/// positions within the visible list rather than a lifetime count.
pub fn format_laps(laps: &[Lap]) -> String {
    if laps.is_empty() {
        return NO_LAPS.to_string();
    }
    laps.iter()
        .enumerate()
        .map(|(index, Lap(elapsed))| {
            format!("#{} {}", laps.len() - index, format_stopwatch(*elapsed))
        })
        .collect::<Vec<_>>()
        .join(" · ")
}

fn render_stopwatch(sink: &dyn RenderSink, event: &StopwatchEvent) {
    match event {
        StopwatchEvent::Started { .. } => {
            sink.stopwatch_status("Running");
            sink.stopwatch_toggle_label("Pause");
        }
        StopwatchEvent::Tick { elapsed } => sink.stopwatch_display(&format_stopwatch(*elapsed)),
        StopwatchEvent::Paused { elapsed } => {
            sink.stopwatch_display(&format_stopwatch(*elapsed));
            sink.stopwatch_status("Paused");
            sink.stopwatch_toggle_label("Resume");
        }
        StopwatchEvent::Reset => {
            sink.stopwatch_display(&format_stopwatch(Duration::ZERO));
            sink.stopwatch_status("Idle");
            sink.stopwatch_toggle_label("Start");
            sink.stopwatch_laps(NO_LAPS);
        }
        StopwatchEvent::LapRecorded { laps } => sink.stopwatch_laps(&format_laps(laps)),
    }
}

fn render_countdown_time(sink: &dyn RenderSink, remaining: Duration, duration: Duration) {
    sink.countdown_display(&format_countdown(remaining));
    if let Some(fraction) = progress_fraction(remaining, duration) {
        sink.countdown_progress(&format_progress(fraction));
    }
}

fn render_countdown(sink: &dyn RenderSink, event: &CountdownEvent) {
    match event {
        CountdownEvent::Started { minutes, duration } => {
            sink.countdown_status("Running");
            sink.countdown_label(&format!("Counting down from {minutes} min"));
            sink.countdown_pause_label("Pause");
            render_countdown_time(sink, *duration, *duration);
        }
        CountdownEvent::Tick {
            remaining,
            duration,
        } => render_countdown_time(sink, *remaining, *duration),
        CountdownEvent::Paused { .. } => {
            sink.countdown_status("Paused");
            sink.countdown_pause_label("Resume");
        }
        CountdownEvent::Resumed { .. } => {
            sink.countdown_status("Running");
            sink.countdown_pause_label("Pause");
        }
        CountdownEvent::Finished | CountdownEvent::Cancelled => {
            sink.countdown_status("Idle");
            sink.countdown_pause_label("Pause");
            sink.countdown_label(if *event == CountdownEvent::Finished {
                COUNTDOWN_DONE
            } else {
                COUNTDOWN_PROMPT
            });
            render_idle_countdown(sink);
        }
    }
}

fn render_idle_countdown(sink: &dyn RenderSink) {
    sink.countdown_display(&format_countdown(Duration::ZERO));
    sink.countdown_progress(&format_progress(0.0));
}

fn render_clock(sink: &dyn RenderSink, face: &ClockFace) {
    sink.clock_time(&face.time);
    sink.clock_date(&face.date);
}

/// Owns one of each controller and routes between them and a render sink.
pub struct UiBinder {
    clock: ClockTicker,
    stopwatch: Stopwatch,
    countdown: Countdown,
    sink: Arc<dyn RenderSink>,
    presets: Vec<u32>,
    hints: Vec<String>,
}

impl UiBinder {
    /// Builds the controllers, subscribing each one's events to `sink`.
    pub fn new(
        config: &TimerboxConfig,
        scheduler: Arc<dyn Scheduler>,
        time: Arc<dyn TimeSource>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let clock_sink = sink.clone();
        let clock_publisher: Publisher<ClockFace> =
            Arc::new(move |face: &ClockFace| render_clock(clock_sink.as_ref(), face));
        let stopwatch_sink = sink.clone();
        let stopwatch_publisher: Publisher<StopwatchEvent> =
            Arc::new(move |event: &StopwatchEvent| {
                render_stopwatch(stopwatch_sink.as_ref(), event)
            });
        let countdown_sink = sink.clone();
        let countdown_publisher: Publisher<CountdownEvent> =
            Arc::new(move |event: &CountdownEvent| {
                render_countdown(countdown_sink.as_ref(), event)
            });

        Self {
            clock: ClockTicker::new(
                scheduler.clone(),
                clock_publisher,
                config.clock_interval(),
                config.timezone,
                &config.date_format,
            ),
            stopwatch: Stopwatch::new(
                scheduler.clone(),
                time.clone(),
                stopwatch_publisher,
                config.stopwatch_interval(),
                config.max_laps,
            ),
            countdown: Countdown::new(
                scheduler,
                time,
                countdown_publisher,
                config.countdown_interval(),
            ),
            sink,
            presets: config.presets.clone(),
            hints: config.hints.clone(),
        }
    }

    /// Renders the initial state, starts the clock and picks a footer hint.
    pub fn init(&self) {
        self.clock.start();

        self.sink.stopwatch_display(&format_stopwatch(Duration::ZERO));
        self.sink.stopwatch_status("Idle");
        self.sink.stopwatch_toggle_label("Start");
        self.sink.stopwatch_laps(NO_LAPS);

        self.sink.countdown_status("Idle");
        self.sink.countdown_label(COUNTDOWN_PROMPT);
        self.sink.countdown_pause_label("Pause");
        render_idle_countdown(self.sink.as_ref());

        if let Some(hint) = self.hints.choose(&mut rand::thread_rng()) {
            self.sink.footer_hint(hint);
        }
        debug!(presets = ?self.presets, "Widget initialised.");
    }

    /// Routes a control to its controller operation.
    pub fn handle(&self, control: Control) {
        debug!(?control, "Control received.");
        match control {
            Control::StopwatchToggle => self.stopwatch.toggle(),
            Control::StopwatchLap => self.stopwatch.lap(),
            Control::StopwatchReset => self.stopwatch.reset(),
            Control::CountdownPause => self.countdown.pause(),
            Control::CountdownCancel => self.countdown.cancel(),
            Control::Preset(minutes) => self.countdown.start_preset(minutes),
        }
    }

    /// The configured preset controls, in minutes.
    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn laps_render_with_descending_ordinals() {
        let laps = [Lap(ms(4_000)), Lap(ms(3_000)), Lap(ms(2_500))];
        assert_eq!(
            format_laps(&laps),
            "#3 00:04.0 · #2 00:03.0 · #1 00:02.5"
        );
        assert_eq!(format_laps(&[]), NO_LAPS);
    }

    #[test]
    fn controls_parse_from_shell_words() {
        assert_eq!("start".parse::<Control>().unwrap(), Control::StopwatchToggle);
        assert_eq!("sw lap".parse::<Control>().unwrap(), Control::StopwatchLap);
        assert_eq!("reset".parse::<Control>().unwrap(), Control::StopwatchReset);
        assert_eq!("cd pause".parse::<Control>().unwrap(), Control::CountdownPause);
        assert_eq!("cancel".parse::<Control>().unwrap(), Control::CountdownCancel);
        assert_eq!("preset 25".parse::<Control>().unwrap(), Control::Preset(25));
        assert_eq!("5".parse::<Control>().unwrap(), Control::Preset(5));
        assert!("preset soon".parse::<Control>().is_err());
        assert!("".parse::<Control>().is_err());
        assert!("launch rockets".parse::<Control>().is_err());
    }
}
