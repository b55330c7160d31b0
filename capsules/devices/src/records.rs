//! Fixed-layout EEPROM records, one per device kind, each closed by its
//! own trailing CRC-16. Every record is exactly
//! [`EEPROM_PAGE_BYTES`] * 2 bytes (two 1-Wire EEPROM pages), little-endian
//! throughout, CRC-16 computed over every byte but the trailing two.

use kernel::crc::crc16;

/// One 1-Wire EEPROM page, per `original_source/L4_HandleDefn.c`'s
/// `OW_EEPROM_MEMORY_PAGE_SIZE`.
pub const EEPROM_PAGE_BYTES: usize = 32;
/// Two pages make up one device record.
pub const RECORD_BYTES: usize = EEPROM_PAGE_BYTES * 2;

/// Handle's own record: procedure/fire counters plus the limits that make
/// end-of-life a threshold check rather than a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleRecord {
    pub procedure_count: u32,
    pub procedure_limit: u32,
    pub fire_count: u32,
    pub fire_limit: u32,
    pub battery_charge_cycles_used: u32,
    pub battery_charge_cycles_limit: u32,
}

/// A record with no lifecycle counters of its own: clamshell, reload, and
/// cartridge share this shape (an identity field plus a used flag), per
/// `original_source/L4_HandleDefn.c`'s general EEPROM layout for
/// non-Handle devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimpleDeviceRecord {
    pub lot_id: u32,
    pub used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterRecord {
    pub lot_id: u32,
    pub strain_gauge_zero: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryRecord {
    pub charge_cycles_used: u32,
    pub charge_cycles_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RtcRecord {
    pub calibration: u16,
}

impl HandleRecord {
    pub fn encode(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0..4].copy_from_slice(&self.procedure_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.procedure_limit.to_le_bytes());
        buf[8..12].copy_from_slice(&self.fire_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.fire_limit.to_le_bytes());
        buf[16..20].copy_from_slice(&self.battery_charge_cycles_used.to_le_bytes());
        buf[20..24].copy_from_slice(&self.battery_charge_cycles_limit.to_le_bytes());
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        buf[RECORD_BYTES - 2..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Result<HandleRecord, kernel::errorcode::ErrorCode> {
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        let stored = u16::from_le_bytes([buf[RECORD_BYTES - 2], buf[RECORD_BYTES - 1]]);
        if crc != stored {
            return Err(kernel::errorcode::ErrorCode::CRCFAIL);
        }
        Ok(HandleRecord {
            procedure_count: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            procedure_limit: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            fire_count: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            fire_limit: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
            battery_charge_cycles_used: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
            battery_charge_cycles_limit: u32::from_le_bytes(buf[20..24].try_into().unwrap()),
        })
    }

    /// Remaining procedures before `HANDLE_EOL_ZEROPROCEDURECOUNT`
    /// triggers, saturating at zero per
    /// `original_source/L4_HandleDefn.c`'s `CheckHandleStartupErrors`.
    pub fn remaining_procedures(&self) -> u32 {
        self.procedure_limit.saturating_sub(self.procedure_count)
    }

    pub fn remaining_fires(&self) -> u32 {
        self.fire_limit.saturating_sub(self.fire_count)
    }

    pub fn remaining_battery_charge_cycles(&self) -> u32 {
        self.battery_charge_cycles_limit
            .saturating_sub(self.battery_charge_cycles_used)
    }
}

impl SimpleDeviceRecord {
    pub fn encode(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0..4].copy_from_slice(&self.lot_id.to_le_bytes());
        buf[4] = self.used as u8;
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        buf[RECORD_BYTES - 2..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Result<SimpleDeviceRecord, kernel::errorcode::ErrorCode> {
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        let stored = u16::from_le_bytes([buf[RECORD_BYTES - 2], buf[RECORD_BYTES - 1]]);
        if crc != stored {
            return Err(kernel::errorcode::ErrorCode::CRCFAIL);
        }
        Ok(SimpleDeviceRecord {
            lot_id: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            used: buf[4] != 0,
        })
    }
}

impl AdapterRecord {
    pub fn encode(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0..4].copy_from_slice(&self.lot_id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.strain_gauge_zero.to_le_bytes());
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        buf[RECORD_BYTES - 2..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Result<AdapterRecord, kernel::errorcode::ErrorCode> {
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        let stored = u16::from_le_bytes([buf[RECORD_BYTES - 2], buf[RECORD_BYTES - 1]]);
        if crc != stored {
            return Err(kernel::errorcode::ErrorCode::CRCFAIL);
        }
        Ok(AdapterRecord {
            lot_id: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            strain_gauge_zero: u16::from_le_bytes(buf[4..6].try_into().unwrap()),
        })
    }

    /// `true` when the strain gauge reads zero at rest, the condition
    /// `ADAPTER_SG_ZERO` raises.
    pub fn strain_gauge_reads_zero(&self) -> bool {
        self.strain_gauge_zero == 0
    }
}

impl BatteryRecord {
    pub fn encode(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0..4].copy_from_slice(&self.charge_cycles_used.to_le_bytes());
        buf[4..8].copy_from_slice(&self.charge_cycles_limit.to_le_bytes());
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        buf[RECORD_BYTES - 2..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Result<BatteryRecord, kernel::errorcode::ErrorCode> {
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        let stored = u16::from_le_bytes([buf[RECORD_BYTES - 2], buf[RECORD_BYTES - 1]]);
        if crc != stored {
            return Err(kernel::errorcode::ErrorCode::CRCFAIL);
        }
        Ok(BatteryRecord {
            charge_cycles_used: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            charge_cycles_limit: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

impl RtcRecord {
    pub fn encode(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0..2].copy_from_slice(&self.calibration.to_le_bytes());
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        buf[RECORD_BYTES - 2..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_BYTES]) -> Result<RtcRecord, kernel::errorcode::ErrorCode> {
        let crc = crc16(&buf[0..RECORD_BYTES - 2]);
        let stored = u16::from_le_bytes([buf[RECORD_BYTES - 2], buf[RECORD_BYTES - 1]]);
        if crc != stored {
            return Err(kernel::errorcode::ErrorCode::CRCFAIL);
        }
        Ok(RtcRecord {
            calibration: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
        })
    }
}
