//! Paged EEPROM read/write over a [`Transport`], matching
//! `original_source/L4_HandleDefn.c`'s `HandleEepRead`/`HandleEepUpdate`:
//! select the device by ROM ID, then read or write both
//! [`crate::records::EEPROM_PAGE_BYTES`]-byte pages back to back.

use crate::records::RECORD_BYTES;
use kernel::errorcode::ErrorCode;
use kernel::hil::onewire::Link;
use kernel::onewire_types::{Bus, RomId};
use onewire::Transport;

/// Reads a device's full two-page record into `out`.
pub fn read_record<L: Link>(
    transport: &mut Transport<L>,
    bus: Bus,
    device: RomId,
) -> Result<[u8; RECORD_BYTES], ErrorCode> {
    transport.send(bus, device, &[])?;
    let mut out = [0u8; RECORD_BYTES];
    transport.receive(bus, &mut out)?;
    Ok(out)
}

/// Writes a device's full two-page record, as encoded by one of the
/// `records` structs' `encode()` methods.
pub fn write_record<L: Link>(
    transport: &mut Transport<L>,
    bus: Bus,
    device: RomId,
    record: &[u8; RECORD_BYTES],
) -> Result<(), ErrorCode> {
    transport.send(bus, device, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::hil::onewire::{Pullup, Speed};

    /// A fake device that discards the address-select framing (one ROM
    /// command byte plus an 8-byte ROM ID) `Transport::send` prepends, then
    /// treats everything after that as the memory payload — enough to
    /// exercise the paged read/write round trip without a real bus-master.
    struct LoopbackLink {
        memory: [u8; RECORD_BYTES],
        cursor: usize,
        header_remaining: usize,
    }

    const FRAMING_BYTES: usize = 1 + 8;

    impl Link for LoopbackLink {
        fn init(&mut self) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn reset(&mut self) -> Result<bool, ErrorCode> {
            self.cursor = 0;
            self.header_remaining = FRAMING_BYTES;
            Ok(true)
        }
        fn write_bit(&mut self, _bit: bool) -> Result<(), ErrorCode> {
            Ok(())
        }
        fn read_bit(&mut self) -> Result<bool, ErrorCode> {
            Ok(false)
        }
        fn write_byte(&mut self, byte: u8) -> Result<(), ErrorCode> {
            if self.header_remaining > 0 {
                self.header_remaining -= 1;
                return Ok(());
            }
            if self.cursor < self.memory.len() {
                self.memory[self.cursor] = byte;
                self.cursor += 1;
            }
            Ok(())
        }
        fn read_byte(&mut self) -> Result<u8, ErrorCode> {
            if self.header_remaining > 0 {
                self.header_remaining -= 1;
                return Ok(0);
            }
            let byte = self.memory.get(self.cursor).copied().unwrap_or(0);
            self.cursor += 1;
            Ok(byte)
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
    fn write_then_read_round_trips_through_the_device() {
        let link = LoopbackLink {
            memory: [0; RECORD_BYTES],
            cursor: 0,
            header_remaining: FRAMING_BYTES,
        };
        let mut transport = Transport::new(link);
        let record = crate::records::SimpleDeviceRecord { lot_id: 7, used: true }.encode();
        write_record(&mut transport, Bus::Clamshell, RomId::new(0x17), &record).unwrap();
        let read_back = read_record(&mut transport, Bus::Clamshell, RomId::new(0x17)).unwrap();
        assert_eq!(read_back, record);
    }
}
