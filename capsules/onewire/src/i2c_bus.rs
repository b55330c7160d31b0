//! The narrow I2C surface the bus-master register driver needs: one
//! function-code write, one register write, one register read. Scoped down
//! from a general `hil::i2c::I2CDevice` (which this workspace doesn't
//! otherwise need) the way `capsules/src/bus.rs` scopes its `Bus` trait
//! down to exactly the operations its callers use.

use kernel::errorcode::ErrorCode;

/// Fixed I2C address of the bus-master chip (DS2465-class), per
/// `original_source/L3_OneWireLink.c`.
pub const BUS_MASTER_ADDRESS: u8 = 0x18;

pub trait I2cBus {
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ErrorCode>;
    fn read_register(&mut self, register: u8) -> Result<u8, ErrorCode>;
}
