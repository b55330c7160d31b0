//! Fault aggregator, grounded on
//! `original_source/FaultHandler.h`'s `FAULTINFO_STARTUP`
//! (`ErrorStatus: u64` + `FaultHandlerAppInit: bool`) and
//! `FaultHandlerSetFault`/`GetHeartBeatLedPeriod`/`SetHeartBeatPeriod`.
//!
//! Every other capsule in the workspace that can detect a fault condition
//! holds a `&FaultAggregator` rather than a raw `Publisher`: routing every
//! `set()` through one mutex-serialized word is what makes the drain-time
//! dedup in scenarios possible.

use kernel::events::Publisher;
use kernel::fault_types::{self, FaultCause};
use kernel::sync::NamedMutex;
use std::collections::HashSet;

/// Default heartbeat LED period, in milliseconds, before any capsule has
/// called `set_heartbeat_period_ms`.
const DEFAULT_HEARTBEAT_PERIOD_MS: u32 = 1000;

struct State {
    word: u64,
    ready_to_publish: bool,
    heartbeat_period_ms: u32,
}

pub struct FaultAggregator {
    state: NamedMutex<State>,
}

impl FaultAggregator {
    pub fn new() -> FaultAggregator {
        FaultAggregator {
            state: NamedMutex::new(
                "fault_aggregator",
                State {
                    word: 0,
                    ready_to_publish: false,
                    heartbeat_period_ms: DEFAULT_HEARTBEAT_PERIOD_MS,
                },
            ),
        }
    }

    /// Sets or clears `cause`'s bit. Before the first `drain_startup`,
    /// this only records the bit — nothing is published yet, so a burst
    /// of faults raised during boot collapses to whatever
    /// `drain_startup` later dedups down to. After `drain_startup`, a
    /// newly-set bit publishes immediately.
    pub fn set(&self, cause: FaultCause, active: bool, publisher: &mut dyn Publisher) {
        let mut guard = self.state.lock();
        let bit = 1u64 << (cause as usize);
        let was_set = guard.word & bit != 0;
        if active {
            guard.word |= bit;
        } else {
            guard.word &= !bit;
        }

        let row = fault_types::lookup(cause);
        match cause.severity() {
            kernel::debug::Severity::Flt => kernel::debug_flt!("{}", row.text),
            kernel::debug::Severity::Wng => kernel::debug_wng!("{}", row.text),
            _ => kernel::debug!("{}", row.text),
        }

        if active && !was_set && guard.ready_to_publish {
            publisher.publish(row.signal);
        }
    }

    /// Sets a fault cause identified by its raw bit index, the shape a
    /// cause arrives in off a byte-oriented IPC channel. An index outside
    /// `FaultCause`'s range is rejected with a debug trace rather than
    /// panicking, per the aggregator's out-of-range invariant.
    pub fn set_by_index(&self, index: usize, active: bool, publisher: &mut dyn Publisher) {
        match FaultCause::from_index(index) {
            Some(cause) => self.set(cause, active, publisher),
            None => kernel::debug_trace!("fault index {} out of range, rejected", index),
        }
    }

    /// Flips the `ready_to_publish` gate and publishes one signal per
    /// distinct cause->signal mapping among the bits already set,
    /// collapsing duplicates the way scenarios require
    /// (two causes that share a signal publish that signal once).
    pub fn drain_startup(&self, publisher: &mut dyn Publisher) {
        let mut guard = self.state.lock();
        guard.ready_to_publish = true;

        let mut seen = HashSet::new();
        for index in 0..FaultCause::COUNT {
            if guard.word & (1u64 << index) == 0 {
                continue;
            }
            let cause = FaultCause::from_index(index).expect("dense table");
            let row = fault_types::lookup(cause);
            if seen.insert(row.signal) {
                publisher.publish(row.signal);
            }
        }
    }

    pub fn heartbeat_period_ms(&self) -> u32 {
        self.state.lock().heartbeat_period_ms
    }

    pub fn set_heartbeat_period_ms(&self, period_ms: u32) {
        self.state.lock().heartbeat_period_ms = period_ms;
    }

    pub fn is_set(&self, cause: FaultCause) -> bool {
        let guard = self.state.lock();
        guard.word & (1u64 << (cause as usize)) != 0
    }
}

impl Default for FaultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::events::testing::RecordingPublisher;
    use kernel::fault_types::SignalId;

    #[test]
    fn faults_set_before_ready_do_not_publish() {
        let aggregator = FaultAggregator::new();
        let mut publisher = RecordingPublisher::new();
        aggregator.set(FaultCause::BatteryIsLow, true, &mut publisher);
        assert!(publisher.published.is_empty());
        assert!(aggregator.is_set(FaultCause::BatteryIsLow));
    }

    #[test]
    fn scenario_a_two_distinct_causes_publish_twice() {
        let aggregator = FaultAggregator::new();
        let mut publisher = RecordingPublisher::new();
        aggregator.set(FaultCause::ReqrstFpgaSelftest, true, &mut publisher);
        aggregator.set(FaultCause::BatteryIsLow, true, &mut publisher);
        aggregator.drain_startup(&mut publisher);
        assert_eq!(
            publisher.published,
            vec![SignalId::PReqRstSig, SignalId::PBatteryLowSig]
        );
    }

    #[test]
    fn scenario_b_shared_signal_publishes_once() {
        let aggregator = FaultAggregator::new();
        let mut publisher = RecordingPublisher::new();
        aggregator.set(FaultCause::ReqrstFpgaSelftest, true, &mut publisher);
        aggregator.set(FaultCause::ReqrstMotorTest, true, &mut publisher);
        aggregator.drain_startup(&mut publisher);
        assert_eq!(publisher.published, vec![SignalId::PReqRstSig]);
    }

    #[test]
    fn post_drain_faults_publish_immediately() {
        let aggregator = FaultAggregator::new();
        let mut publisher = RecordingPublisher::new();
        aggregator.drain_startup(&mut publisher);
        aggregator.set(FaultCause::BatteryIsLow, true, &mut publisher);
        assert_eq!(publisher.published, vec![SignalId::PBatteryLowSig]);
    }

    #[test]
    fn out_of_range_index_is_rejected_without_panic() {
        let aggregator = FaultAggregator::new();
        let mut publisher = RecordingPublisher::new();
        aggregator.set_by_index(9000, true, &mut publisher);
        assert!(publisher.published.is_empty());
    }

    #[test]
    fn heartbeat_period_defaults_and_updates() {
        let aggregator = FaultAggregator::new();
        assert_eq!(aggregator.heartbeat_period_ms(), DEFAULT_HEARTBEAT_PERIOD_MS);
        aggregator.set_heartbeat_period_ms(250);
        assert_eq!(aggregator.heartbeat_period_ms(), 250);
    }
}
