//! Shared primitives for the reliability-core capsules: the error enum,
//! logging façade, CRC routines, 1-Wire wire vocabulary, fault-cause/signal
//! vocabulary, hardware-interface-layer traits, a mutex wrapper matching the
//! RTOS abstraction layer's locking idiom, and the event-publication trait
//! the bridge and every fault-raising capsule share.
//!
//! Mirrors the role tock's `kernel` crate plays for its capsules: a small,
//! dependency-free foundation every higher-tier crate in the workspace
//! builds on.

pub mod crc;
pub mod debug;
pub mod errorcode;
pub mod events;
pub mod fault_types;
pub mod hil;
pub mod onewire_types;
pub mod sync;

pub use errorcode::ErrorCode;
