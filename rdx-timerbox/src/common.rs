//! Contains common, primitive types shared by every Timerbox component.
//!
//! This module defines the handle type used to identify repeating tasks and
//! the callback type controllers use to publish their state. Using distinct
//! types keeps the controllers decoupled from whatever draws them.

use slotmap::new_key_type;
use std::sync::Arc;

new_key_type! {
    /// Uniquely and safely identifies a repeating task registered with a `Scheduler`.
    ///
    /// A handle is returned when a task is scheduled and is the only way to
    /// cancel it. Handles are versioned, so a cancelled handle never aliases a
    /// task scheduled later into the same slot.
    pub struct TaskHandle;
}

/// A render callback a controller pushes its events through.
///
/// Publishers are invoked synchronously from within controller operations and
/// repeating-task callbacks. They must not call back into the controller that
/// owns them.
pub type Publisher<E> = Arc<dyn Fn(&E) + Send + Sync>;

