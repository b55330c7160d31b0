//! Bus-master register and function-code map, copied from the constants in
//! `original_source/L3_OneWireLink.c`. Kept as a flat module of `pub
//! const`s rather than a struct, matching how the source itself is a flat
//! `#define` block rather than a bitfield type.

pub const REG_FUNC: u8 = 0x60;
/// Not a real DS2465 register: this driver's simplified two-write framing
/// for the single-bit function's operand byte, since the real chip packs
/// it into the same I2C transaction as the function-select byte.
pub const REG_FUNC_PARAM: u8 = 0x60 | 0x80;
pub const REG_MASTER_STATUS: u8 = 0x61;
pub const REG_READ_DATA: u8 = 0x62;
pub const REG_MST_CONFIG: u8 = 0x67;
pub const REG_TW1L: u8 = 0x6D;
pub const REG_MANUF_ID1: u8 = 0x71;
pub const REG_MANUF_ID2: u8 = 0x72;

pub const FUNC_1WIRE_MASTER_RESET: u8 = 0xF0;
pub const FUNC_1WIRE_RESET_PULSE: u8 = 0xB4;
pub const FUNC_1WIRE_SINGLE_BIT: u8 = 0x87;
pub const FUNC_1WIRE_WRITE_BYTE: u8 = 0xA5;
pub const FUNC_1WIRE_READ_BYTE: u8 = 0x96;

pub const STATUS_MASK_1WB: u8 = 0x01;
pub const STATUS_MASK_PPD: u8 = 0x02;
pub const STATUS_MASK_SD: u8 = 0x04;
pub const STATUS_MASK_SBR: u8 = 0x20;

pub const CONFIG_MASK_SPU: u8 = 0x04;
pub const CONFIG_MASK_1WS: u8 = 0x08;

pub const COVIDIEN_MANUF_ID1: u8 = 0x60;
pub const COVIDIEN_MANUF_ID2: u8 = 0x00;

/// Overdrive tW1L timing value reprogrammed on wake from sleep, per
/// `original_source/L3_OneWireLink.c`.
pub const OVERDRIVE_TW1L_VALUE: u8 = 0x03;

/// Attempts `OwLinkInit` retries the manufacturer-ID probe before giving
/// up.
pub const INIT_RETRY_COUNT: u8 = 5;

/// Iterations `reset()` polls the busy bit before treating the bus as
/// stuck.
pub const IDLE_WAIT_RETRY_COUNT: u8 = 10;
