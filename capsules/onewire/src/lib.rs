//! 1-Wire bus-master link, ROM-level network commands, and per-bus
//! transport/search contexts.

pub mod i2c_bus;
pub mod link;
pub mod network;
pub mod regs;
pub mod transport;

pub use i2c_bus::I2cBus;
pub use link::OneWireLink;
pub use network::{RomCommand, SearchContext};
pub use transport::Transport;
