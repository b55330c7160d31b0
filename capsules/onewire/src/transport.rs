//! Per-bus search context and the scan/send/receive/speed/enable surface,
//! grounded on `original_source/L3_OneWireTransport.h`'s
//! `OwTransportScan`/`OwTransportSend`/`OwTransportReceive`/
//! `OwTransportSpeed`/`OwTransportEnable`.

use crate::network::{self, SearchContext};
use kernel::errorcode::ErrorCode;
use kernel::hil::onewire::{Link, Pullup, Speed};
use kernel::onewire_types::{Bus, RomId, ScanType};
use std::collections::HashMap;

/// Owns one [`SearchContext`] per physical bus and multiplexes a single
/// [`Link`] across all four, exactly as the source's one bus-master chip
/// serves CLAMSHELL/EXP/LOCAL/CONNECTORS through a shared transport layer.
pub struct Transport<L: Link> {
    link: L,
    contexts: HashMap<Bus, SearchContext>,
    enabled: HashMap<Bus, bool>,
}

impl<L: Link> Transport<L> {
    pub fn new(link: L) -> Transport<L> {
        let mut contexts = HashMap::new();
        let mut enabled = HashMap::new();
        for bus in Bus::ALL {
            contexts.insert(bus, SearchContext::default());
            enabled.insert(bus, true);
        }
        Transport { link, contexts, enabled }
    }

    /// Resets the search context for every bus, as
    /// `OwTransportResetContex` does on init or after a topology change.
    pub fn reset_context(&mut self) {
        for ctx in self.contexts.values_mut() {
            *ctx = SearchContext::default();
        }
    }

    pub fn enable(&mut self, bus: Bus, on: bool) {
        self.enabled.insert(bus, on);
    }

    fn check_enabled(&self, bus: Bus) -> Result<(), ErrorCode> {
        if *self.enabled.get(&bus).unwrap_or(&false) {
            Ok(())
        } else {
            Err(ErrorCode::OFF)
        }
    }

    /// Enumerates every device (or every alarming device) on `bus`,
    /// repeating the search until it stops finding new ROM IDs, the way
    /// `OwTransportScan` drains a bus into a caller-supplied list.
    pub fn scan(&mut self, bus: Bus, scan_type: ScanType, out: &mut Vec<RomId>) -> Result<(), ErrorCode> {
        self.check_enabled(bus)?;
        let ctx = self.contexts.entry(bus).or_default();
        *ctx = SearchContext::default();
        loop {
            match network::search(&mut self.link, scan_type, ctx)? {
                Some(id) => {
                    out.push(id);
                    if ctx.last_device {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(())
    }

    pub fn send(&mut self, bus: Bus, target: RomId, data: &[u8]) -> Result<(), ErrorCode> {
        self.check_enabled(bus)?;
        if !self.link.reset()? {
            return Err(ErrorCode::NODEVICE);
        }
        network::select(&mut self.link, network::RomCommand::Match, Some(target))?;
        for &byte in data {
            self.link.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn receive(&mut self, bus: Bus, buf: &mut [u8]) -> Result<(), ErrorCode> {
        self.check_enabled(bus)?;
        for slot in buf.iter_mut() {
            *slot = self.link.read_byte()?;
        }
        Ok(())
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.link.set_speed(speed);
    }

    pub fn set_pullup(&mut self, pullup: Pullup) {
        self.link.set_pullup(pullup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InertLink;
    impl Link for InertLink {
        fn init(&mut self) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn reset(&mut self) -> Result<bool, ErrorCode> {
            Ok(false)
        }
        fn write_bit(&mut self, _bit: bool) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn read_bit(&mut self) -> Result<bool, ErrorCode> {
            Ok(false)
        }
        fn write_byte(&mut self, _byte: u8) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn read_byte(&mut self) -> Result<u8, ErrorCode> {
            Ok(0)
        }
        fn set_speed(&mut self, _speed: Speed) {}
        fn set_pullup(&mut self, _pullup: Pullup) {}
        fn update_config(&mut self) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn sleep(&mut self) -> Result<(), ErrorCode> {
            Ok(())
        }
    }

    #[test]
    fn scan_on_an_empty_bus_yields_no_devices() {
        let mut transport = Transport::new(InertLink);
        let mut found = Vec::new();
        transport.scan(Bus::Clamshell, ScanType::Full, &mut found).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn disabled_bus_rejects_scan() {
        let mut transport = Transport::new(InertLink);
        transport.enable(Bus::Exp, false);
        let mut found = Vec::new();
        assert_eq!(
            transport.scan(Bus::Exp, ScanType::Full, &mut found),
            Err(ErrorCode::OFF)
        );
    }

    #[test]
    fn send_without_presence_is_nodevice() {
        let mut transport = Transport::new(InertLink);
        assert_eq!(
            transport.send(Bus::Local, RomId::new(0x17), &[1, 2, 3]),
            Err(ErrorCode::NODEVICE)
        );
    }
}
