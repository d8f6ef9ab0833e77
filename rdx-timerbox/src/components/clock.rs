//! The wall-clock ticker.

use crate::common::{Publisher, TaskHandle};
use crate::events::ClockFace;
use crate::scheduler::Scheduler;
use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt::{Display, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Short weekday / month form, e.g. `Thu, Oct 15, 2026`.
pub const DEFAULT_DATE_FORMAT: &str = "%a, %b %-d, %Y";

/// Formats a wall-clock instant into a [`ClockFace`].
///
/// A `date_format` chrono cannot render falls back to [`DEFAULT_DATE_FORMAT`].
pub fn clock_face<Z>(now: &DateTime<Z>, date_format: &str) -> ClockFace
where
    Z: TimeZone,
    Z::Offset: Display,
{
    let mut date = String::new();
    if write!(date, "{}", now.format(date_format)).is_err() {
        warn!(date_format, "Unusable date format, using the default.");
        date.clear();
        let _ = write!(date, "{}", now.format(DEFAULT_DATE_FORMAT));
    }
    ClockFace {
        time: now.format("%H:%M:%S").to_string(),
        date,
    }
}

/// Samples wall-clock time once per interval and publishes it.
///
/// There is no stop operation: once started the ticker runs for as long as
/// its scheduler does.
pub struct ClockTicker {
    scheduler: Arc<dyn Scheduler>,
    publisher: Publisher<ClockFace>,
    interval: Duration,
    timezone: Option<Tz>,
    date_format: Arc<str>,
    task: Mutex<Option<TaskHandle>>,
}

impl ClockTicker {
    /// `timezone` of `None` renders local time.
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        publisher: Publisher<ClockFace>,
        interval: Duration,
        timezone: Option<Tz>,
        date_format: &str,
    ) -> Self {
        Self {
            scheduler,
            publisher,
            interval,
            timezone,
            date_format: Arc::from(date_format),
            task: Mutex::new(None),
        }
    }

    /// Publishes the current time immediately, then once per interval.
    ///
    /// Calling `start` again is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }
        let publisher = self.publisher.clone();
        let timezone = self.timezone;
        let date_format = self.date_format.clone();
        let sample = move || publisher(&Self::sample(timezone, &date_format));

        sample();
        *task = Some(
            self.scheduler
                .schedule_repeating(self.interval, Box::new(sample)),
        );
        debug!(interval = ?self.interval, ?timezone, "Clock ticker started.");
    }

    /// The current face without publishing it.
    pub fn now(&self) -> ClockFace {
        Self::sample(self.timezone, &self.date_format)
    }

    fn sample(timezone: Option<Tz>, date_format: &str) -> ClockFace {
        match timezone {
            Some(tz) => clock_face(&Utc::now().with_timezone(&tz), date_format),
            None => clock_face(&Local::now(), date_format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use chrono::NaiveDate;

    #[test]
    fn face_uses_24_hour_time_and_date_pattern() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(21, 4, 9)
            .unwrap()
            .and_utc();
        let face = clock_face(&at, "%a, %b %-d, %Y");
        assert_eq!(face.time, "21:04:09");
        assert_eq!(face.date, "Thu, Oct 15, 2026");
    }

    #[test]
    fn face_respects_timezone() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 3, 30, 0).unwrap();
        let tokyo = at.with_timezone(&chrono_tz::Asia::Tokyo);
        let face = clock_face(&tokyo, "%A, %B %-d, %Y");
        assert_eq!(face.time, "12:30:00");
        assert_eq!(face.date, "Thursday, January 1, 2026");
    }

    #[test]
    fn unusable_date_pattern_falls_back_to_default() {
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let face = clock_face(&at, "%Q");
        assert_eq!(face.time, "08:00:00");
        assert_eq!(face.date, "Thu, Oct 15, 2026");
    }

    #[test]
    fn ticker_publishes_now_and_every_interval() {
        let clock = Arc::new(ManualScheduler::new());
        let faces = Arc::new(Mutex::new(Vec::new()));
        let sink = faces.clone();
        let ticker = ClockTicker::new(
            clock.clone(),
            Arc::new(move |face: &ClockFace| sink.lock().unwrap().push(face.clone())),
            Duration::from_secs(1),
            Some(Tz::UTC),
            "%Y-%m-%d",
        );

        ticker.start();
        assert_eq!(faces.lock().unwrap().len(), 1);
        clock.advance(Duration::from_millis(3_500));
        ticker.start();

        let faces = faces.lock().unwrap();
        assert_eq!(faces.len(), 4);
        assert_eq!(clock.active_tasks(), 1);
        for face in faces.iter() {
            let parts: Vec<&str> = face.time.split(':').collect();
            assert_eq!(parts.len(), 3);
            assert!(parts.iter().all(|p| p.len() == 2));
            assert_eq!(face.date.len(), 10);
        }
    }
}
