//! End-of-life threshold checks, grounded on
//! `original_source/L4_HandleDefn.c`'s `CheckHandleStartupErrors`: a
//! remaining-count hitting zero raises the matching `HANDLE_EOL_*` fault,
//! evaluated once at startup against the record read off the Handle's own
//! EEPROM.

use crate::records::HandleRecord;
use kernel::events::{Event, Publisher};
use kernel::fault_types::FaultCause;

/// Publishes a fault for every remaining-count that has reached zero.
/// Mirrors the source checking procedure count and fire count
/// independently rather than short-circuiting on the first failure.
pub fn check_handle_eol(record: &HandleRecord, publisher: &mut dyn Publisher) {
    if record.remaining_procedures() == 0 {
        publish_fault(publisher, FaultCause::HandleEolZeroprocedurecount);
    }
    if record.remaining_fires() == 0 {
        publish_fault(publisher, FaultCause::HandleEolZerofiringcounter);
    }
    if record.remaining_battery_charge_cycles() == 0 {
        publish_fault(publisher, FaultCause::HandleEolZerobatterychargecycles);
    }
}

fn publish_fault(publisher: &mut dyn Publisher, cause: FaultCause) {
    if let Some(signal) = kernel::events::resolve(Event::Fault(cause)) {
        publisher.publish(signal);
    }
}
