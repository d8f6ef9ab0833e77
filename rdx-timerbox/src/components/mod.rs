//! Contains the controllers that own the widget's time-based state.
//!
//! Each controller owns its own state and at most one repeating-task handle,
//! and publishes strongly-typed events instead of touching a display. The
//! `UiBinder` wires one of each to a render sink.

pub mod clock;
pub mod countdown;
pub mod stopwatch;
