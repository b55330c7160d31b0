//! Hardware interface layer: the traits capsules program against instead of
//! a concrete bus-master or storage chip, mirroring tock's `kernel::hil`
//! (e.g. `hil::bus::Bus`, `hil::i2c::I2CMaster`). Every trait here returns
//! `Result<T, ErrorCode>` directly rather than completing through a
//! callback, since this workspace runs its capsules as genuine blocking
//! RTOS tasks rather than tock's single-threaded event loop.

pub mod filesystem;
pub mod onewire;
pub mod watchdog;
