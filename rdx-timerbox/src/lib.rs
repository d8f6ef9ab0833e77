//! # Timerbox
//!
//! A clock, stopwatch and countdown timer widget, decoupled from any UI toolkit.
//!
//! Timerbox owns the time-keeping logic of a small focus-timer widget and
//! leaves drawing and input to a front end. It is designed to be embedded in
//! a terminal shell, a web page or a host "mini app" container alike.
//!
//! ## Core Concepts
//!
//! - **Scheduler**: the single source of repeating callbacks. Controllers
//!   hold at most one task handle each and cancel it before replacing it.
//! - **Controllers**: `ClockTicker`, `Stopwatch` and `Countdown` own their
//!   state and publish strongly-typed events (`ClockFace`, `StopwatchEvent`,
//!   `CountdownEvent`). They never touch a display.
//! - **Binder**: `UiBinder` maps `Control` inputs onto controller operations
//!   and renders controller events into a `RenderSink`'s named slots.
//! - **Bootstrap**: optional, best-effort detection of an embedding host.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use timerbox::prelude::*;
//! use std::sync::Arc;
//!
//! struct Stdout;
//!
//! impl RenderSink for Stdout {
//!     fn stopwatch_display(&self, text: &str) {
//!         println!("stopwatch {text}");
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TimerboxConfig::default();
//!     let scheduler = Arc::new(TokioScheduler::new()?);
//!     let binder = UiBinder::new(&config, scheduler, Arc::new(TokioTime), Arc::new(Stdout));
//!
//!     binder.init();
//!     binder.handle(Control::StopwatchToggle);
//!     tokio::time::sleep(std::time::Duration::from_secs(2)).await;
//!     binder.handle(Control::StopwatchLap);
//!     Ok(())
//! }
//! ```

pub const WIDGET_NAME: &str = "Timerbox";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod binder;
pub mod bootstrap;
pub mod common;
pub mod components;
pub mod config;
pub mod events;
pub mod format;
pub mod scheduler;

/// A prelude module for easy importing of the most common Timerbox types.
pub mod prelude {
    pub use crate::binder::{Control, RenderSink, UiBinder};
    pub use crate::bootstrap::{HostEnvironment, Mode, ProcessHost};
    pub use crate::common::{Publisher, TaskHandle};
    pub use crate::components::clock::ClockTicker;
    pub use crate::components::countdown::{Countdown, CountdownPhase};
    pub use crate::components::stopwatch::{Stopwatch, StopwatchStatus};
    pub use crate::config::TimerboxConfig;
    pub use crate::events::{ClockFace, CountdownEvent, Lap, StopwatchEvent};
    pub use crate::scheduler::{ManualScheduler, Scheduler, TimeSource, TokioScheduler, TokioTime};
}
