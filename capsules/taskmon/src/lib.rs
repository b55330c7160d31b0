//! Task check-in tracking, load accounting, and watchdog arbitration.

pub mod monitor;
pub mod stats;

pub use monitor::{
    TaskMonitor, FREE_STACK_THRESHOLD_PERCENT, MAX_CHECKIN_TIMEOUT_MS,
    PEAK_LOAD_THRESHOLD_CENTIPERCENT, SWEEP_PERIOD_MS, WATCHDOG_TIMEOUT_MS,
};
pub use stats::{Slot, MAX_SLOTS};
