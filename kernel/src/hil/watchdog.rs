//! Interface the task monitor uses to arbitrate the hardware watchdog:
//! only the task monitor is allowed to kick it, and only once every
//! registered task has checked in within its budget.

use crate::errorcode::ErrorCode;

/// A kickable hardware watchdog timer.
pub trait WatchDog {
    /// Arms the watchdog with the given timeout, in milliseconds.
    fn start(&mut self, timeout_ms: u32) -> Result<(), ErrorCode>;

    /// Refreshes the countdown. Only the task monitor's periodic sweep
    /// calls this, and only when every registered task is current.
    fn kick(&mut self);

    /// Disarms the watchdog, e.g. while a debugger is attached.
    fn stop(&mut self);
}
