//! A render sink that keeps the latest value of every slot for the shell to draw.

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use timerbox::prelude::RenderSink;

#[derive(Debug, Default, Clone)]
struct Dashboard {
    clock_time: String,
    clock_date: String,
    stopwatch_display: String,
    stopwatch_status: String,
    stopwatch_laps: String,
    stopwatch_toggle: String,
    countdown_display: String,
    countdown_status: String,
    countdown_label: String,
    countdown_progress: String,
    countdown_pause: String,
    footer_hint: String,
    footer_mode: String,
    env_label: String,
}

/// Stores slot writes and, while `live` is set, echoes state changes as they happen.
///
/// High-frequency slots (displays, progress, the clock) are only stored;
/// they show up on the next `show`.
pub struct TerminalSink {
    dashboard: Mutex<Dashboard>,
    live: Arc<AtomicBool>,
}

impl TerminalSink {
    pub fn new(live: Arc<AtomicBool>) -> Self {
        Self {
            dashboard: Mutex::new(Dashboard {
                footer_mode: "Mode: web".to_string(),
                env_label: "web".to_string(),
                ..Dashboard::default()
            }),
            live,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn echo(&self, tag: &str, text: &str) {
        if self.live.load(Ordering::Relaxed) {
            println!("\n<-- [{}] {}\n>> ", tag, text);
        }
    }

    /// Prints every slot as a small dashboard.
    pub fn print(&self) {
        let d = self.lock().clone();
        println!(
            "  {} {}  {}",
            format!("{:<10}", "Clock").cyan().bold(),
            d.clock_time.bold(),
            d.clock_date.dimmed()
        );
        println!(
            "  {} {}  [{}]  (start control: {})",
            format!("{:<10}", "Stopwatch").cyan().bold(),
            d.stopwatch_display.bold(),
            d.stopwatch_status.yellow(),
            d.stopwatch_toggle
        );
        println!("  {:<10} laps: {}", "", d.stopwatch_laps);
        println!(
            "  {} {}  [{}]  {}  (pause control: {})",
            format!("{:<10}", "Countdown").cyan().bold(),
            d.countdown_display.bold(),
            d.countdown_status.yellow(),
            d.countdown_progress,
            d.countdown_pause
        );
        println!("  {:<10} {}", "", d.countdown_label);
        println!(
            "  {} · {}",
            d.footer_mode.dimmed(),
            d.footer_hint.dimmed()
        );
    }

    /// The current env label, `web` until the host says otherwise.
    pub fn mode_label(&self) -> String {
        self.lock().env_label.clone()
    }
}

impl RenderSink for TerminalSink {
    fn clock_time(&self, text: &str) {
        self.lock().clock_time = text.to_string();
    }
    fn clock_date(&self, text: &str) {
        self.lock().clock_date = text.to_string();
    }
    fn stopwatch_display(&self, text: &str) {
        self.lock().stopwatch_display = text.to_string();
    }
    fn stopwatch_status(&self, text: &str) {
        self.lock().stopwatch_status = text.to_string();
        self.echo("STOPWATCH", text);
    }
    fn stopwatch_laps(&self, text: &str) {
        self.lock().stopwatch_laps = text.to_string();
        self.echo("LAPS", text);
    }
    fn stopwatch_toggle_label(&self, text: &str) {
        self.lock().stopwatch_toggle = text.to_string();
    }
    fn countdown_display(&self, text: &str) {
        self.lock().countdown_display = text.to_string();
    }
    fn countdown_status(&self, text: &str) {
        self.lock().countdown_status = text.to_string();
        self.echo("COUNTDOWN", text);
    }
    fn countdown_label(&self, text: &str) {
        self.lock().countdown_label = text.to_string();
        self.echo("COUNTDOWN", text);
    }
    fn countdown_progress(&self, width: &str) {
        self.lock().countdown_progress = width.to_string();
    }
    fn countdown_pause_label(&self, text: &str) {
        self.lock().countdown_pause = text.to_string();
    }
    fn footer_hint(&self, text: &str) {
        self.lock().footer_hint = text.to_string();
    }
    fn footer_mode(&self, text: &str) {
        self.lock().footer_mode = text.to_string();
    }
    fn env_label(&self, text: &str) {
        self.lock().env_label = text.to_string();
        self.echo("HOST", text);
    }
}
