//! Per-slot accounting, grounded on `original_source/TaskMonitor.c`'s
//! `xTaskInformation_t`: context-switch tick bookkeeping, load averaging,
//! and the check-in timestamp a slot's owner is expected to refresh.

/// Maximum number of task slots the monitor can track. The original
/// firmware sized this off `OS_LOWEST_PRIO + 1`; this workspace has no
/// RTOS priority space to borrow the bound from, so it is a fixed
/// constant instead.
pub const MAX_SLOTS: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub registered: bool,
    pub checkin_timeout_ms: u32,
    pub last_checkin_ms: u32,
    pub peak_checkin_difference_ms: u32,
    pub wdog_timed_out: bool,

    switched_in_tick: u32,
    pub context_switches: u32,
    pub elapsed_ticks: u32,
    pub peak_elapsed_ticks: u32,
    pub cumulative_elapsed_ticks: u64,

    /// This period's load, in hundredths of a percent (`9000` == 90.00%),
    /// mirroring `u32LoadAverageOneUserPeriod`'s scale.
    pub load_centipercent: u32,
    pub peak_load_centipercent: u32,
    /// Free stack headroom as a whole percent, reported by the task's
    /// owner; unreported slots default to 100 so an idle slot never trips
    /// the low-stack check on its own.
    pub free_stack_percent: u8,
    /// Set once a sweep finds this slot's load over the peak-load
    /// threshold. There is no task-priority space in this workspace to
    /// actually lower, so this is the nearest observable stand-in for
    /// `OSTaskChangePrio(task, TASK_PRIORITY_LAST)`.
    pub priority_lowered: bool,
}

impl Slot {
    pub const fn empty() -> Slot {
        Slot {
            registered: false,
            checkin_timeout_ms: 0,
            last_checkin_ms: 0,
            peak_checkin_difference_ms: 0,
            wdog_timed_out: false,
            switched_in_tick: 0,
            context_switches: 0,
            elapsed_ticks: 0,
            peak_elapsed_ticks: 0,
            cumulative_elapsed_ticks: 0,
            load_centipercent: 0,
            peak_load_centipercent: 0,
            free_stack_percent: 100,
            priority_lowered: false,
        }
    }

    /// Called from the context-switch-in hook. Records the free-running
    /// timer value the slot was scheduled at.
    pub fn record_switch_in(&mut self, tick_now: u32) {
        self.switched_in_tick = tick_now;
    }

    /// Called from the context-switch-out hook. `tick_now` is read off the
    /// same free-running timer as `record_switch_in`; `wrapping_sub`
    /// produces the right elapsed duration across an overflow the way an
    /// unsigned countdown/count-up timer naturally does.
    pub fn record_switch_out(&mut self, tick_now: u32) {
        let elapsed = tick_now.wrapping_sub(self.switched_in_tick);
        self.elapsed_ticks = elapsed;
        self.peak_elapsed_ticks = self.peak_elapsed_ticks.max(elapsed);
        self.cumulative_elapsed_ticks += elapsed as u64;
        self.context_switches = self.context_switches.wrapping_add(1);
    }

    /// Converts this period's accumulated run time into a load percentage
    /// and resets the accumulator, mirroring `TaskMonitorUpdateLoads`
    /// dividing `u32CumulativeElapsedTicks` by the period length and then
    /// zeroing it for the next period. `period_ticks` of `0` yields a load
    /// of `0` rather than dividing by zero.
    pub fn take_period_load(&mut self, period_ticks: u32) {
        self.load_centipercent = if period_ticks == 0 {
            0
        } else {
            ((self.cumulative_elapsed_ticks * 10_000) / period_ticks as u64) as u32
        };
        self.peak_load_centipercent = self.peak_load_centipercent.max(self.load_centipercent);
        self.cumulative_elapsed_ticks = 0;
    }

    /// Records the free stack headroom the task's owner measured for
    /// itself, as a whole percent of its stack allocation.
    pub fn report_free_stack_percent(&mut self, percent: u8) {
        self.free_stack_percent = percent;
    }

    /// Difference, in milliseconds, between `now_ms` and this slot's last
    /// check-in, again via `wrapping_sub` so a free-running millisecond
    /// clock rolling over doesn't manufacture a spurious timeout.
    pub fn checkin_difference_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_checkin_ms)
    }

    pub fn checkin(&mut self, now_ms: u32) {
        let difference = self.checkin_difference_ms(now_ms);
        self.peak_checkin_difference_ms = self.peak_checkin_difference_ms.max(difference);
        self.last_checkin_ms = now_ms;
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_accounting_tracks_peak_and_cumulative() {
        let mut slot = Slot::empty();
        slot.record_switch_in(100);
        slot.record_switch_out(150);
        slot.record_switch_in(200);
        slot.record_switch_out(280);
        assert_eq!(slot.context_switches, 2);
        assert_eq!(slot.peak_elapsed_ticks, 80);
        assert_eq!(slot.cumulative_elapsed_ticks, 50 + 80);
    }

    #[test]
    fn switch_out_survives_a_timer_wraparound() {
        let mut slot = Slot::empty();
        slot.record_switch_in(u32::MAX - 5);
        slot.record_switch_out(10);
        assert_eq!(slot.elapsed_ticks, 16);
    }

    #[test]
    fn checkin_updates_peak_difference() {
        let mut slot = Slot::empty();
        slot.checkin(0);
        slot.checkin(300);
        assert_eq!(slot.peak_checkin_difference_ms, 300);
        slot.checkin(310);
        assert_eq!(slot.peak_checkin_difference_ms, 300);
    }

    #[test]
    fn period_load_is_a_fraction_of_the_period_and_resets_the_accumulator() {
        let mut slot = Slot::empty();
        slot.record_switch_in(0);
        slot.record_switch_out(4_500);
        slot.take_period_load(5_000);
        assert_eq!(slot.load_centipercent, 9_000);
        assert_eq!(slot.peak_load_centipercent, 9_000);
        assert_eq!(slot.cumulative_elapsed_ticks, 0);

        slot.take_period_load(5_000);
        assert_eq!(slot.load_centipercent, 0);
        assert_eq!(slot.peak_load_centipercent, 9_000);
    }

    #[test]
    fn free_stack_defaults_high_until_reported() {
        let mut slot = Slot::empty();
        assert_eq!(slot.free_stack_percent, 100);
        slot.report_free_stack_percent(3);
        assert_eq!(slot.free_stack_percent, 3);
    }
}
