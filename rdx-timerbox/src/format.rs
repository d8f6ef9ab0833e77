//! Pure conversions from durations into display strings.

use std::time::Duration;

/// Formats an elapsed stopwatch time as `MM:SS.T`.
///
/// Minutes and seconds are floored and zero-padded to two digits; minutes
/// grow past two digits rather than wrapping into hours. `T` is the floored
/// tenth of a second.
pub fn format_stopwatch(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let total_seconds = total_ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let tenths = (total_ms % 1000) / 100;
    format!("{minutes:02}:{seconds:02}.{tenths}")
}

/// Formats a countdown remaining time as `MM:SS`.
///
/// The remaining time is rounded to the nearest second (halves round up)
/// before splitting, so 59.6s reads `01:00`.
pub fn format_countdown(remaining: Duration) -> String {
    let total_seconds = (remaining.as_millis() + 500) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Returns the fraction of `duration` that has been consumed, clamped to `[0, 1]`.
///
/// Returns `None` for a zero duration, where progress is undefined.
pub fn progress_fraction(remaining: Duration, duration: Duration) -> Option<f64> {
    if duration.is_zero() {
        return None;
    }
    let fraction = 1.0 - remaining.as_secs_f64() / duration.as_secs_f64();
    Some(fraction.clamp(0.0, 1.0))
}

/// Renders a progress fraction as a CSS-style width, e.g. `42.0%`.
pub fn format_progress(fraction: f64) -> String {
    format!("{:.1}%", fraction.clamp(0.0, 1.0) * 100.0)
}
