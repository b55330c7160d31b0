//! The register-level 1-Wire bus-master interface:
//! the trait the network/transport layers program against instead of a
//! concrete I2C-attached bus-master chip. Grounded on the `Bus`/`Client`
//! split of `capsules/src/bus.rs` (one trait of operations, a companion
//! enum of tunables) adapted to blocking `Result` returns per the
//! concurrency-model generalization.

use crate::errorcode::ErrorCode;

/// 1-Wire bus timing mode. Overdrive roughly quarters the standard
/// bit/byte timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Standard,
    Overdrive,
}

/// Strong pull-up request, cached by `set_pullup` and flushed explicitly
/// (see `update_config`/next `reset`), not left implicit in the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pullup {
    Off,
    Strong,
}

/// Register-level operations against the bus-master chip.
pub trait Link {
    /// Probes the bus-master's manufacturer ID, retrying up to 5 times
    /// before returning `ErrorCode::NODEVICE`.
    fn init(&mut self) -> Result<(), ErrorCode>;

    /// Issues a reset/presence pulse. `Ok(true)` when a device asserted
    /// presence, `Ok(false)` on a clean idle bus, `Err(ErrorCode::BUSERR)`
    /// on a detected short within the idle-wait budget (10 x 1ms).
    fn reset(&mut self) -> Result<bool, ErrorCode>;

    fn write_bit(&mut self, bit: bool) -> Result<(), ErrorCode>;

    /// Returns the bit the bus-master observed on the line.
    fn read_bit(&mut self) -> Result<bool, ErrorCode>;

    fn write_byte(&mut self, byte: u8) -> Result<(), ErrorCode>;

    fn read_byte(&mut self) -> Result<u8, ErrorCode>;

    fn set_speed(&mut self, speed: Speed);

    /// Caches the pull-up request; takes effect at the next
    /// `update_config` or `reset`
    fn set_pullup(&mut self, pullup: Pullup);

    /// Flushes a cached `set_pullup` request to hardware without waiting
    /// for the next `reset`.
    fn update_config(&mut self) -> Result<(), ErrorCode>;

    /// Power-down/wake cycle: toggles the pin, reprograms overdrive
    /// write-low timing, and performs a mandatory `reset` on wake (spec
    /// section 4.A).
    fn sleep(&mut self) -> Result<(), ErrorCode>;
}
