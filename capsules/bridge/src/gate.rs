//! The ordering gate, grounded on `original_source/L4_HandleDefn.c`'s
//! device-classification comment describing the physical insertion chain
//! Handle -> Clamshell -> Adapter -> Reload -> Cartridge, and on the
//! `{Absent, PresentNotPublished, Published, LostNotPublished}` state
//! machine assigned to the bridge: a connect event a capsule
//! detects is only forwarded once every lower-ordinal device already
//! shows `Published`; a disconnect is only forwarded once every
//! higher-ordinal device already shows `Absent`. Battery and RTC are not
//! part of the chain and pass straight through.

use kernel::events::{Event, Publisher};
use kernel::onewire_types::DeviceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Absent,
    PresentNotPublished,
    Published,
    LostNotPublished,
}

/// Tracks the five ordinal device kinds' raw-detected-vs-published state
/// and releases connect/disconnect events to a downstream [`Publisher`]
/// only once the ordering rule permits it.
pub struct OrderingGate {
    slots: [SlotState; DeviceKind::ORDERING.len()],
}

impl OrderingGate {
    pub fn new() -> OrderingGate {
        OrderingGate {
            slots: [SlotState::Absent; DeviceKind::ORDERING.len()],
        }
    }

    /// Feeds a raw device-lifecycle or fault event through the gate,
    /// forwarding whatever the ordering rule now permits to `publisher`.
    /// A single connect can cascade: if Clamshell was already detected
    /// but waiting on Handle, Handle's own connect releases both in one
    /// call.
    pub fn notify(&mut self, event: Event, publisher: &mut dyn Publisher) {
        match event {
            Event::Fault(_) => publish_event(publisher, event),
            Event::DeviceConnected(kind) => match kind.ordinal() {
                Some(idx) => {
                    if self.slots[idx] == SlotState::Absent {
                        self.slots[idx] = SlotState::PresentNotPublished;
                    }
                    self.release_connects(publisher);
                }
                None => publish_event(publisher, event),
            },
            Event::DeviceDisconnected(kind) => match kind.ordinal() {
                Some(idx) => {
                    if self.slots[idx] == SlotState::Published {
                        self.slots[idx] = SlotState::LostNotPublished;
                    }
                    self.release_disconnects(publisher);
                }
                None => publish_event(publisher, event),
            },
        }
    }

    /// Ascending sweep: a slot publishes once every lower-ordinal slot
    /// already reads `Published`.
    fn release_connects(&mut self, publisher: &mut dyn Publisher) {
        for idx in 0..self.slots.len() {
            let predecessors_ready = idx == 0 || self.slots[idx - 1] == SlotState::Published;
            if self.slots[idx] == SlotState::PresentNotPublished && predecessors_ready {
                publish_event(publisher, Event::DeviceConnected(DeviceKind::ORDERING[idx]));
                self.slots[idx] = SlotState::Published;
            }
        }
    }

    /// Descending sweep: a slot publishes its loss once every
    /// higher-ordinal slot already reads `Absent`.
    fn release_disconnects(&mut self, publisher: &mut dyn Publisher) {
        for idx in (0..self.slots.len()).rev() {
            let successors_gone =
                idx == self.slots.len() - 1 || self.slots[idx + 1] == SlotState::Absent;
            if self.slots[idx] == SlotState::LostNotPublished && successors_gone {
                publish_event(publisher, Event::DeviceDisconnected(DeviceKind::ORDERING[idx]));
                self.slots[idx] = SlotState::Absent;
            }
        }
    }
}

/// Resolves an [`Event`] to its signal and forwards it.
fn publish_event(publisher: &mut dyn Publisher, event: Event) {
    if let Some(signal) = kernel::events::resolve(event) {
        publisher.publish(signal);
    }
}

impl Default for OrderingGate {
    fn default() -> Self {
        Self::new()
    }
}
