//! The task monitor itself: slot registration, check-in tracking, the
//! periodic sweep, and watchdog arbitration. Grounded on
//! `original_source/TaskMonitor.c`'s `TaskMonitorRegisterTask`,
//! `TaskMonitorTaskCheckin`, `TaskMonitorEnable`/`Disable`, and the sweep
//! loop in `TaskMonitorTask` that only refreshes the watchdog once every
//! registered slot's check-in age is within its own budget.

use crate::stats::{Slot, MAX_SLOTS};
use kernel::errorcode::ErrorCode;
use kernel::events::{Event, Publisher};
use kernel::fault_types::FaultCause;
use kernel::hil::watchdog::WatchDog;
use kernel::sync::NamedMutex;

/// A task's registered check-in budget may not exceed this, mirroring
/// `TASKMOMITOR_MAX_CHECKIN_TIMEOUT`.
pub const MAX_CHECKIN_TIMEOUT_MS: u32 = 30_000;

/// How often the periodic sweep runs, mirroring `TASK_MONITOR_UPDATE_PERIOD`.
pub const SWEEP_PERIOD_MS: u32 = 5_000;

/// Watchdog timeout armed on `enable`: two sweep periods, so a single
/// missed sweep cycle does not itself trip a reset.
pub const WATCHDOG_TIMEOUT_MS: u32 = SWEEP_PERIOD_MS * 2;

/// Above this per-period load (hundredths of a percent), a slot is
/// considered overloaded, mirroring `TASKMONITOR_PEAKLOAD_THRESHOLD`.
pub const PEAK_LOAD_THRESHOLD_CENTIPERCENT: u32 = 9_000;

/// Below this free-stack percentage, a slot fails its stack check,
/// mirroring `TASKMONITOR_STACKSPACE_LOWTHD`.
pub const FREE_STACK_THRESHOLD_PERCENT: u8 = 10;

struct Inner<W: WatchDog> {
    slots: [Slot; MAX_SLOTS],
    enabled: bool,
    fault_raised: bool,
    watchdog: W,
}

/// Tracks every registered task's check-in and load statistics, and is
/// the sole caller allowed to kick `W`.
pub struct TaskMonitor<W: WatchDog> {
    inner: NamedMutex<Inner<W>>,
}

impl<W: WatchDog> TaskMonitor<W> {
    pub fn new(watchdog: W) -> TaskMonitor<W> {
        TaskMonitor {
            inner: NamedMutex::new(
                "task_monitor",
                Inner {
                    slots: [Slot::empty(); MAX_SLOTS],
                    enabled: false,
                    fault_raised: false,
                    watchdog,
                },
            ),
        }
    }

    /// Registers `slot` with a check-in budget. A budget over
    /// `MAX_CHECKIN_TIMEOUT_MS` or a slot index past `MAX_SLOTS` is
    /// rejected rather than silently clamped.
    pub fn register(&self, slot: usize, checkin_timeout_ms: u32) -> Result<(), ErrorCode> {
        if slot >= MAX_SLOTS {
            return Err(ErrorCode::INVAL);
        }
        if checkin_timeout_ms > MAX_CHECKIN_TIMEOUT_MS {
            return Err(ErrorCode::INVAL);
        }
        let mut guard = self.inner.lock();
        guard.slots[slot] = Slot::empty();
        guard.slots[slot].registered = true;
        guard.slots[slot].checkin_timeout_ms = checkin_timeout_ms;
        Ok(())
    }

    pub fn unregister(&self, slot: usize) -> Result<(), ErrorCode> {
        if slot >= MAX_SLOTS {
            return Err(ErrorCode::INVAL);
        }
        self.inner.lock().slots[slot] = Slot::empty();
        Ok(())
    }

    /// Resets every registered slot's check-in clock to `now_ms` and arms
    /// the watchdog. Mirrors `TaskMonitorEnable` re-baselining each slot's
    /// `u32LastCheckIn` so a task that was already overdue before enable
    /// doesn't trip a fault on the very first sweep.
    pub fn enable(&self, now_ms: u32) {
        let mut guard = self.inner.lock();
        for slot in guard.slots.iter_mut() {
            if slot.registered {
                slot.last_checkin_ms = now_ms;
                slot.peak_checkin_difference_ms = 0;
            }
        }
        guard.enabled = true;
        guard.fault_raised = false;
        guard.watchdog.start(WATCHDOG_TIMEOUT_MS).ok();
    }

    pub fn disable(&self) {
        let mut guard = self.inner.lock();
        guard.enabled = false;
        guard.watchdog.stop();
    }

    pub fn checkin(&self, slot: usize, now_ms: u32) -> Result<(), ErrorCode> {
        if slot >= MAX_SLOTS {
            return Err(ErrorCode::INVAL);
        }
        let mut guard = self.inner.lock();
        if !guard.enabled || !guard.slots[slot].registered {
            return Err(ErrorCode::OFF);
        }
        guard.slots[slot].checkin(now_ms);
        Ok(())
    }

    pub fn record_switch_in(&self, slot: usize, tick_now: u32) {
        if slot >= MAX_SLOTS {
            return;
        }
        self.inner.lock().slots[slot].record_switch_in(tick_now);
    }

    pub fn record_switch_out(&self, slot: usize, tick_now: u32) {
        if slot >= MAX_SLOTS {
            return;
        }
        self.inner.lock().slots[slot].record_switch_out(tick_now);
    }

    /// Records a slot's self-measured free-stack headroom, consulted by
    /// the next sweep's stack check.
    pub fn report_free_stack(&self, slot: usize, free_stack_percent: u8) {
        if slot >= MAX_SLOTS {
            return;
        }
        self.inner.lock().slots[slot].report_free_stack_percent(free_stack_percent);
    }

    /// Runs the periodic check. The watchdog is kicked only if every
    /// registered slot is current on its check-in, under the peak-load
    /// threshold, and above the free-stack threshold; the first sweep to
    /// find any slot failing one of those raises `ReqrstTaskmonitorFail`
    /// once and leaves the watchdog unrefreshed, letting it expire and
    /// reset the device — the same "stop refreshing rather than reset
    /// directly" arbitration `TaskMonitorTask` performs. `period_ticks` is
    /// the tick-domain length of the interval since the previous sweep,
    /// used to turn each slot's accumulated run time into a load
    /// percentage the way `TaskMonitorUpdateLoads` divides by
    /// `u32TotalTime`.
    pub fn sweep(&self, now_ms: u32, period_ticks: u32, publisher: &mut dyn Publisher) {
        let mut guard = self.inner.lock();
        if !guard.enabled {
            return;
        }

        let mut all_healthy = true;
        for slot in guard.slots.iter_mut() {
            if !slot.registered {
                continue;
            }
            if slot.checkin_difference_ms(now_ms) > slot.checkin_timeout_ms {
                all_healthy = false;
                slot.wdog_timed_out = true;
                kernel::debug_wng!("task slot missed its check-in budget");
            }

            slot.take_period_load(period_ticks);
            if slot.load_centipercent > PEAK_LOAD_THRESHOLD_CENTIPERCENT {
                all_healthy = false;
                if !slot.priority_lowered {
                    slot.priority_lowered = true;
                    kernel::debug_wng!("task slot over peak-load threshold, priority lowered");
                }
            }

            if slot.free_stack_percent < FREE_STACK_THRESHOLD_PERCENT {
                all_healthy = false;
                kernel::debug_wng!("task slot free stack below threshold");
            }
        }

        if all_healthy {
            guard.watchdog.kick();
        } else if !guard.fault_raised {
            guard.fault_raised = true;
            if let Some(signal) =
                kernel::events::resolve(Event::Fault(FaultCause::ReqrstTaskmonitorFail))
            {
                publisher.publish(signal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::events::testing::RecordingPublisher;
    use kernel::fault_types::SignalId;

    #[derive(Default)]
    struct FakeWatchdog {
        started: Option<u32>,
        kicks: u32,
        stopped: bool,
    }

    impl WatchDog for FakeWatchdog {
        fn start(&mut self, timeout_ms: u32) -> Result<(), ErrorCode> {
            self.started = Some(timeout_ms);
            Ok(())
        }
        fn kick(&mut self) {
            self.kicks += 1;
        }
        fn stop(&mut self) {
            self.stopped = true;
        }
    }

    #[test]
    fn registering_past_the_slot_table_is_rejected() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        assert_eq!(monitor.register(MAX_SLOTS, 1000), Err(ErrorCode::INVAL));
    }

    #[test]
    fn registering_over_the_max_timeout_is_rejected() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        assert_eq!(
            monitor.register(0, MAX_CHECKIN_TIMEOUT_MS + 1),
            Err(ErrorCode::INVAL)
        );
    }

    #[test]
    fn checkin_before_enable_is_rejected() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 1000).unwrap();
        assert_eq!(monitor.checkin(0, 100), Err(ErrorCode::OFF));
    }

    #[test]
    fn current_slots_kick_the_watchdog() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 1000).unwrap();
        monitor.enable(0);
        monitor.checkin(0, 100).unwrap();

        let mut publisher = RecordingPublisher::new();
        monitor.sweep(200, SWEEP_PERIOD_MS, &mut publisher);
        assert!(publisher.published.is_empty());
    }

    #[test]
    fn an_overdue_slot_raises_a_fault_once_and_stops_kicking() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 100).unwrap();
        monitor.enable(0);

        let mut publisher = RecordingPublisher::new();
        monitor.sweep(1000, SWEEP_PERIOD_MS, &mut publisher);
        monitor.sweep(1100, SWEEP_PERIOD_MS, &mut publisher);
        assert_eq!(publisher.published, vec![SignalId::PReqRstSig]);
    }

    #[test]
    fn disable_stops_the_watchdog_and_sweep_becomes_a_no_op() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 100).unwrap();
        monitor.enable(0);
        monitor.disable();

        let mut publisher = RecordingPublisher::new();
        monitor.sweep(5000, SWEEP_PERIOD_MS, &mut publisher);
        assert!(publisher.published.is_empty());
    }

    #[test]
    fn an_overloaded_slot_blocks_the_kick_and_lowers_priority() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 1_000).unwrap();
        monitor.enable(0);
        monitor.checkin(0, 100).unwrap();
        monitor.record_switch_in(0, 0);
        monitor.record_switch_out(0, SWEEP_PERIOD_MS);

        let mut publisher = RecordingPublisher::new();
        monitor.sweep(200, SWEEP_PERIOD_MS, &mut publisher);
        assert_eq!(publisher.published, vec![SignalId::PReqRstSig]);
        assert!(monitor.inner.lock().slots[0].priority_lowered);
    }

    #[test]
    fn low_free_stack_blocks_the_kick() {
        let monitor = TaskMonitor::new(FakeWatchdog::default());
        monitor.register(0, 1_000).unwrap();
        monitor.enable(0);
        monitor.checkin(0, 100).unwrap();
        monitor.report_free_stack(0, 2);

        let mut publisher = RecordingPublisher::new();
        monitor.sweep(200, SWEEP_PERIOD_MS, &mut publisher);
        assert_eq!(publisher.published, vec![SignalId::PReqRstSig]);
    }
}
