//! Adapter / fault event bridge: the ordering gate sitting between
//! whatever detects a device-lifecycle transition (the device manager's
//! per-bus scan) and the concrete [`kernel::events::Publisher`] a board
//! wires up. The cause-to-signal table and the device new/lost x kind
//! lookup themselves already live in `kernel::events`/`kernel::fault_types`
//! since multiple capsules need them directly; this crate owns only the
//! cross-device ordering state those lookups don't carry.

pub mod gate;

pub use gate::OrderingGate;
