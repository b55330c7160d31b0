//! Device manager: bus scan/diff, paged EEPROM records, hardware-version
//! lookup, and end-of-life checks.

pub mod eeprom;
pub mod eol;
pub mod hwversion;
pub mod manager;
pub mod records;

pub use manager::{DeviceManager, SCAN_PERIOD_MS};
