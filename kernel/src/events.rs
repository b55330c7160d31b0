//! The publication seam between capsules that detect conditions (devices,
//! task monitor, filesystem, KVF, RDF) and the bridge that turns them into
//! published signals. Grounded on the `Bus`/`Client`
//! split of `capsules/src/bus.rs`: callers hold a `&dyn Publisher` rather
//! than reaching into the bridge directly, so the bridge can be swapped
//! for a fake in tests the way a fake `Client` stands in for a real bus in
//! capsule unit tests.

use crate::fault_types::{FaultCause, SignalId};
use crate::onewire_types::DeviceKind;

/// A condition that can be turned into a published signal: either a fault
/// cause (routed through the cause->signal table) or a device-lifecycle
/// transition (routed through the new/lost x kind lookup).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Fault(FaultCause),
    DeviceConnected(DeviceKind),
    DeviceDisconnected(DeviceKind),
}

/// Maps a device kind to its connected/disconnected signal pair (the
/// device-lifecycle new/lost x kind lookup).
fn device_signal(kind: DeviceKind, connected: bool) -> SignalId {
    match (kind, connected) {
        (DeviceKind::Handle, true) => SignalId::PHandleConnectedSig,
        (DeviceKind::Handle, false) => SignalId::PHandleDisconnectedSig,
        (DeviceKind::Clamshell, true) => SignalId::PClamshellConnectedSig,
        (DeviceKind::Clamshell, false) => SignalId::PClamshellDisconnectedSig,
        (DeviceKind::Adapter, true) => SignalId::PAdapterConnectedSig,
        (DeviceKind::Adapter, false) => SignalId::PAdapterDisconnectedSig,
        (DeviceKind::Reload, true) => SignalId::PReloadConnectedSig,
        (DeviceKind::Reload, false) => SignalId::PReloadDisconnectedSig,
        (DeviceKind::Cartridge, true) => SignalId::PCartridgeConnectedSig,
        (DeviceKind::Cartridge, false) => SignalId::PCartridgeDisconnectedSig,
        (DeviceKind::Battery, true) => SignalId::PBatteryConnectedSig,
        (DeviceKind::Battery, false) => SignalId::PBatteryDisconnectedSig,
        (DeviceKind::Rtc, true) => SignalId::PRtcConnectedSig,
        (DeviceKind::Rtc, false) => SignalId::PRtcDisconnectedSig,
    }
}

/// Routes an [`Event`] to its published signal: a fault cause through
/// [`crate::fault_types::lookup`], a device-lifecycle transition through
/// [`device_signal`]. Always resolves — every `Event` variant maps to
/// exactly one signal, unlike a raw `FaultCause` which can be out of
/// range and rejected (see the fault aggregator's `set`).
pub fn resolve(event: Event) -> Option<SignalId> {
    match event {
        Event::Fault(cause) => Some(crate::fault_types::lookup(cause).signal),
        Event::DeviceConnected(kind) => Some(device_signal(kind, true)),
        Event::DeviceDisconnected(kind) => Some(device_signal(kind, false)),
    }
}

/// Receiver of published signals. The fault aggregator and device manager
/// both hold one of these rather than a concrete bridge, so a capsule
/// under test can substitute a recording fake.
pub trait Publisher {
    fn publish(&mut self, signal: SignalId);
}

/// Test fakes shared across capsule crates, not gated behind `cfg(test)`
/// so that downstream capsule crates (whose tests are separate
/// compilation units) can depend on them too.
pub mod testing {
    use super::{Publisher, SignalId};

    /// A `Publisher` that records every signal it receives, for use in
    /// capsule unit tests that need to assert what was published without
    /// wiring up the real bridge.
    pub struct RecordingPublisher {
        pub published: std::vec::Vec<SignalId>,
    }

    impl RecordingPublisher {
        pub fn new() -> RecordingPublisher {
            RecordingPublisher {
                published: std::vec::Vec::new(),
            }
        }
    }

    impl Default for RecordingPublisher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&mut self, signal: SignalId) {
            self.published.push(signal);
        }
    }
}
