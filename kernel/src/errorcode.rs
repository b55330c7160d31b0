//! A single closed error enum shared by every fallible operation in the
//! reliability core, the way tock's `kernel::ErrorCode` is shared by every
//! HIL trait. Extended past tock's set with the peripheral/persistence
//! taxonomy of the fault-handling design (bus errors, CRC failures, FAT
//! failure kinds) so no module needs a bespoke error type.

/// Error outcomes returned by capsules in this workspace.
///
/// Variants in the first block are carried over from tock's `ErrorCode`
/// (`FAIL`, `BUSY`, `INVAL`, ...); the second block is the 1-Wire/KVF/RDF
/// specific taxonomy added by the fault-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Generic failure condition; used when no more specific code applies.
    FAIL,
    /// Underlying resource is busy with another operation.
    BUSY,
    /// Argument was invalid.
    INVAL,
    /// Buffer too short or too long for the operation.
    SIZE,
    /// No memory available to complete the operation.
    NOMEM,
    /// Operation or value not supported.
    NOSUPPORT,
    /// Underlying hardware is off or not initialized.
    OFF,
    /// The resource is reserved (e.g. an in-flight transaction holds the
    /// scratch buffer).
    RESERVE,
    /// Operation already completed / already exists.
    ALREADY,

    /// No 1-Wire device responded to a reset pulse.
    NODEVICE,
    /// The 1-Wire bus-master reported an electrical short.
    BUSERR,
    /// Link-layer idle-wait exceeded its retry budget.
    TIMEOUT,
    /// A CRC-8 (ROM ID) or CRC-16 (EEPROM page / KVF entry) check failed.
    CRCFAIL,
    /// A read transaction failed at the transport or device layer.
    READFAIL,
    /// A write transaction failed at the transport or device layer.
    WRITEFAIL,

    /// The requested KVF file does not exist (only returned when the
    /// caller explicitly asked not to create one).
    FILEDOESNOTEXIST,
    /// The underlying filesystem reported an I/O failure.
    FILESYSTEM,
    /// The requested key is not present in the KVF file.
    KEYDOESNOTEXIST,
    /// The requested key exists but its stored type does not match.
    KEYTYPEDOESNOTMATCH,
}

impl ErrorCode {
    /// `true` for the bus/CRC/file error kinds that escalate to the fault
    /// aggregator by themselves, as opposed to conditions a caller is
    /// expected to retry locally.
    pub fn escalates_to_fault_aggregator(self) -> bool {
        matches!(
            self,
            ErrorCode::CRCFAIL
                | ErrorCode::BUSERR
                | ErrorCode::READFAIL
                | ErrorCode::WRITEFAIL
                | ErrorCode::FILESYSTEM
        )
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}
