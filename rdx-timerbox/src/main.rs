use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use timerbox::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs every slot write instead of drawing it.
struct LogSink;

impl RenderSink for LogSink {
    fn clock_time(&self, text: &str) {
        info!("[CLOCK] {}", text);
    }
    fn stopwatch_display(&self, text: &str) {
        info!("[STOPWATCH] {}", text);
    }
    fn stopwatch_status(&self, text: &str) {
        info!("[STOPWATCH] status: {}", text);
    }
    fn stopwatch_laps(&self, text: &str) {
        info!("[STOPWATCH] laps: {}", text);
    }
    fn countdown_display(&self, text: &str) {
        info!("[COUNTDOWN] {}", text);
    }
    fn countdown_status(&self, text: &str) {
        info!("[COUNTDOWN] status: {}", text);
    }
    fn countdown_label(&self, text: &str) {
        info!("[COUNTDOWN] {}", text);
    }
    fn countdown_progress(&self, width: &str) {
        info!("[COUNTDOWN] progress: {}", width);
    }
    fn footer_hint(&self, text: &str) {
        info!("[FOOTER] {}", text);
    }
}

/// Replays a short session on a virtual clock so the whole widget can be
/// watched end to end in a fraction of a second.
fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Use a custom configuration with coarse render rates to keep the log readable.
    let config = TimerboxConfig {
        stopwatch_interval_ms: 500,
        countdown_interval_ms: 15_000,
        clock_interval_ms: 30_000,
        ..TimerboxConfig::default()
    };
    config.validate()?;

    // 3. Drive everything from a manual scheduler.
    let clock = Arc::new(ManualScheduler::new());
    let binder = UiBinder::new(&config, clock.clone(), clock.clone(), Arc::new(LogSink));
    binder.init();

    // 4. Script the session.
    info!("--- stopwatch: start, two laps, pause, reset ---");
    binder.handle(Control::StopwatchToggle);
    clock.advance(Duration::from_millis(1_500));
    binder.handle(Control::StopwatchLap);
    clock.advance(Duration::from_millis(1_200));
    binder.handle(Control::StopwatchLap);
    binder.handle(Control::StopwatchToggle);
    binder.handle(Control::StopwatchReset);

    info!("--- countdown: 1 minute preset with a pause ---");
    binder.handle(Control::Preset(1));
    clock.advance(Duration::from_secs(20));
    binder.handle(Control::CountdownPause);
    clock.advance(Duration::from_secs(90));
    binder.handle(Control::CountdownPause);
    clock.advance(Duration::from_secs(45));

    info!(
        "Session complete after {:?} of simulated time ({} tasks still scheduled).",
        clock.elapsed(),
        clock.active_tasks()
    );
    Ok(())
}
