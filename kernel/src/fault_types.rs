//! The fault-cause enumeration and published-signal enumeration ("Fault
//! set" / "Cause->Signal map"). Both live in `kernel` because every
//! capsule that can raise a fault (devices, taskmon, fs, kvf, rdf) needs
//! [`FaultCause`], and the bridge that turns causes into signals needs
//! both — putting them in one capsule would make every other capsule
//! depend on it.
//!
//! Variant names follow the `PERMFAIL_*` / `REQRST_*` / `HANDLE_EOL_*`
//! prefix convention (`REQRST_FPGA_SELFTEST`, `BATTERY_ISLOW`, ...): the
//! prefix is also the category the cause->signal table dispatches on.

use enum_primitive::cast::FromPrimitive;
use enum_primitive::enum_from_primitive;

enum_from_primitive! {
/// One bit position in the 64-bit fault status word. Dense
/// and indexable: `cause as usize` is the bit position and the row index
/// into the cause->signal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCause {
    PermfailFpgaSelftest = 0,
    ReqrstFpgaSelftest = 1,
    ReqrstMotorTest = 2,
    PermfailBatteryOnewireRead = 3,
    PermfailBatteryOnewireWrite = 4,
    PermfailI2cLockup = 5,
    PermfailOledSelftest = 6,
    PermfailOnewireAuthenticate = 7,
    PermfailOnewireRead = 8,
    PermfailOnewireWrite = 9,
    PermfailOnewireShort = 10,
    PermfailBatteryOnewireShort = 11,
    PermfailBatteryOnewireAuth = 12,
    PermfailAccelSelftest = 13,
    PermfailAccelComm = 14,
    PermfailRamIntegrity = 15,
    PermfailProgramFlashIntegrity = 16,
    PermfailMemoryFence = 17,
    PermfailFpgaRead = 18,
    ReqrstMotorStallNotCommanded = 19,
    PermfailGpioExpanderComm = 20,
    PermfailWatchdogInit = 21,
    ReqrstTaskmonitorFail = 22,
    ReqrstSystemFault = 23,
    ErrSdcardAbsent = 24,
    PermfailHandleMemoryError = 25,
    ErrPiezoGpio = 26,
    PermfailFilesystemIntegrity = 27,
    BatteryIsLow = 28,
    BatteryInsufficient = 29,
    BatteryOverTemp = 30,
    BatteryShutdown = 31,
    BatteryWarn = 32,
    BatteryEol = 33,
    ErrUsbComm = 34,
    PermfailRtcOnewireComm = 35,
    ErrHeartbeatGpio = 36,
    ErrGreenKeyGpio = 37,
    AdapterUnsupported = 38,
    AdapterUnknown = 39,
    AdapterAuthFailed = 40,
    AdapterCrcFailed = 41,
    AdapterSgZero = 42,
    AdapterShorted = 43,
    ClamshellUnsupported = 44,
    ClamshellAuthFailed = 45,
    ClamshellUsed = 46,
    ClamshellShorted = 47,
    HandleEolZeroprocedurecount = 48,
    HandleEolZerofiringcounter = 49,
    HandleEolZerobatterychargecycles = 50,
    PermfailOnewireNvmTest = 51,
    PermfailOnewireBusShortNoDevice = 52,
    HandleProcedureFireCountTestFail = 53,
}
}

impl FaultCause {
    /// Three severity bands, keyed on the cause's *mapped signal* rather
    /// than its name: `PPermFailSig` logs `Flt`, `PBatteryWarnSig` logs
    /// `Wng`, everything else logs `Err`. Keying on the cause's own
    /// `Permfail*`/`Battery*` prefix instead would disagree with the
    /// table wherever a cause's name and its signal diverge — e.g.
    /// `BatteryIsLow` maps to `PBatteryLowSig`, not `PBatteryWarnSig`, so
    /// it bands as `Err`, not `Wng`.
    pub fn severity(&self) -> crate::debug::Severity {
        use crate::debug::Severity;
        match lookup(*self).signal {
            SignalId::PPermFailSig => Severity::Flt,
            SignalId::PBatteryWarnSig => Severity::Wng,
            _ => Severity::Err,
        }
    }

    pub fn from_index(index: usize) -> Option<FaultCause> {
        FaultCause::from_usize(index)
    }

    pub const COUNT: usize = 54;
}

enum_from_primitive! {
/// Flat enumeration of published signal identifiers: a
/// roughly 30-entry set covering reset requests, permanent failures,
/// battery conditions, device-lifecycle transitions, and the catch-all
/// shell error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalId {
    PReqRstSig = 0,
    PPermFailSig = 1,
    PBatteryLowSig = 2,
    PBatteryInsufficientSig = 3,
    PBatteryOverTempSig = 4,
    PBatteryShutdownSig = 5,
    PBatteryWarnSig = 6,
    PBatteryEolSig = 7,
    PHandleEolSig = 8,
    PAccelErrSig = 9,
    PSdCardErrorSig = 10,
    PAdapterErrorSig = 11,
    PClamshellErrorSig = 12,
    PUsbCommSig = 13,
    PHeartbeatGpioSig = 14,
    PGreenKeyGpioSig = 15,
    PPiezoGpioSig = 16,
    PFilesystemErrorSig = 17,
    PErrShellSig = 18,
    PHandleConnectedSig = 19,
    PHandleDisconnectedSig = 20,
    PClamshellConnectedSig = 21,
    PClamshellDisconnectedSig = 22,
    PAdapterConnectedSig = 23,
    PAdapterDisconnectedSig = 24,
    PReloadConnectedSig = 25,
    PReloadDisconnectedSig = 26,
    PCartridgeConnectedSig = 27,
    PCartridgeDisconnectedSig = 28,
    PBatteryConnectedSig = 29,
    PBatteryDisconnectedSig = 30,
    PRtcConnectedSig = 31,
    PRtcDisconnectedSig = 32,
}
}

/// One row of the immutable cause->signal table: the human-readable text
/// used for logging plus the signal the cause maps to.
#[derive(Debug, Clone, Copy)]
pub struct CauseRow {
    pub cause: FaultCause,
    pub text: &'static str,
    pub signal: SignalId,
}

macro_rules! cause_row {
    ($cause:ident, $text:literal, $signal:ident) => {
        CauseRow {
            cause: FaultCause::$cause,
            text: $text,
            signal: SignalId::$signal,
        }
    };
}

/// Dense, `FaultCause`-indexed table. Multiple causes legitimately map to
/// the same signal (e.g. every `Permfail*`/`Reqrst*` cause maps to
/// `PPermFailSig`/`PReqRstSig`), which is exactly what the aggregator's
/// drain-time deduplication exists to collapse.
pub const CAUSE_TABLE: [CauseRow; FaultCause::COUNT] = [
    cause_row!(PermfailFpgaSelftest, "FPGA self-test failed", PPermFailSig),
    cause_row!(ReqrstFpgaSelftest, "FPGA self-test requires reset", PReqRstSig),
    cause_row!(ReqrstMotorTest, "Motor self-test requires reset", PReqRstSig),
    cause_row!(PermfailBatteryOnewireRead, "Battery 1-Wire read failed", PPermFailSig),
    cause_row!(PermfailBatteryOnewireWrite, "Battery 1-Wire write failed", PPermFailSig),
    cause_row!(PermfailI2cLockup, "I2C bus lockup", PPermFailSig),
    cause_row!(PermfailOledSelftest, "OLED self-test failed", PPermFailSig),
    cause_row!(PermfailOnewireAuthenticate, "1-Wire authenticate failed", PPermFailSig),
    cause_row!(PermfailOnewireRead, "1-Wire read failed", PPermFailSig),
    cause_row!(PermfailOnewireWrite, "1-Wire write failed", PPermFailSig),
    cause_row!(PermfailOnewireShort, "1-Wire bus short", PPermFailSig),
    cause_row!(PermfailBatteryOnewireShort, "Battery 1-Wire short", PPermFailSig),
    cause_row!(PermfailBatteryOnewireAuth, "Battery 1-Wire auth failed", PPermFailSig),
    cause_row!(PermfailAccelSelftest, "Accelerometer self-test failed", PAccelErrSig),
    cause_row!(PermfailAccelComm, "Accelerometer comm failed", PAccelErrSig),
    cause_row!(PermfailRamIntegrity, "RAM integrity check failed", PPermFailSig),
    cause_row!(PermfailProgramFlashIntegrity, "Program flash integrity check failed", PPermFailSig),
    cause_row!(PermfailMemoryFence, "Memory fence violation", PPermFailSig),
    cause_row!(PermfailFpgaRead, "FPGA read failed", PPermFailSig),
    cause_row!(ReqrstMotorStallNotCommanded, "Motor stalled without command", PReqRstSig),
    cause_row!(PermfailGpioExpanderComm, "GPIO expander comm failed", PPermFailSig),
    cause_row!(PermfailWatchdogInit, "Watchdog init failed", PPermFailSig),
    cause_row!(ReqrstTaskmonitorFail, "Task monitor detected an overload or missed check-in", PReqRstSig),
    cause_row!(ReqrstSystemFault, "System fault", PReqRstSig),
    cause_row!(ErrSdcardAbsent, "SD card absent", PSdCardErrorSig),
    cause_row!(PermfailHandleMemoryError, "Handle memory error", PPermFailSig),
    cause_row!(ErrPiezoGpio, "Piezo GPIO error", PPiezoGpioSig),
    cause_row!(PermfailFilesystemIntegrity, "Filesystem integrity check failed", PFilesystemErrorSig),
    cause_row!(BatteryIsLow, "Battery charge is low", PBatteryLowSig),
    cause_row!(BatteryInsufficient, "Battery charge insufficient", PBatteryInsufficientSig),
    cause_row!(BatteryOverTemp, "Battery over temperature", PBatteryOverTempSig),
    cause_row!(BatteryShutdown, "Battery requesting shutdown", PBatteryShutdownSig),
    cause_row!(BatteryWarn, "Battery charge-cycle warning", PBatteryWarnSig),
    cause_row!(BatteryEol, "Battery end of life", PBatteryEolSig),
    cause_row!(ErrUsbComm, "USB comm error", PErrShellSig),
    cause_row!(PermfailRtcOnewireComm, "RTC 1-Wire comm failed", PPermFailSig),
    cause_row!(ErrHeartbeatGpio, "Heartbeat GPIO error", PHeartbeatGpioSig),
    cause_row!(ErrGreenKeyGpio, "Green key GPIO error", PGreenKeyGpioSig),
    cause_row!(AdapterUnsupported, "Unsupported adapter", PAdapterErrorSig),
    cause_row!(AdapterUnknown, "Unknown adapter", PAdapterErrorSig),
    cause_row!(AdapterAuthFailed, "Adapter authentication failed", PAdapterErrorSig),
    cause_row!(AdapterCrcFailed, "Adapter CRC failed", PAdapterErrorSig),
    cause_row!(AdapterSgZero, "Adapter strain gauge reads zero", PAdapterErrorSig),
    cause_row!(AdapterShorted, "Adapter shorted", PAdapterErrorSig),
    cause_row!(ClamshellUnsupported, "Unsupported clamshell", PClamshellErrorSig),
    cause_row!(ClamshellAuthFailed, "Clamshell authentication failed", PClamshellErrorSig),
    cause_row!(ClamshellUsed, "Clamshell already used", PClamshellErrorSig),
    cause_row!(ClamshellShorted, "Clamshell shorted", PClamshellErrorSig),
    cause_row!(HandleEolZeroprocedurecount, "Handle end of life: zero procedures remaining", PHandleEolSig),
    cause_row!(HandleEolZerofiringcounter, "Handle end of life: zero fires remaining", PHandleEolSig),
    cause_row!(HandleEolZerobatterychargecycles, "Handle end of life: zero battery charge cycles remaining", PHandleEolSig),
    cause_row!(PermfailOnewireNvmTest, "1-Wire NVM self-test failed", PPermFailSig),
    cause_row!(PermfailOnewireBusShortNoDevice, "1-Wire bus short with no device present", PPermFailSig),
    cause_row!(HandleProcedureFireCountTestFail, "Handle procedure/fire-count round-trip self-test failed", PPermFailSig),
];

/// Looks up the cause->signal row for `cause`. Table is dense over
/// `FaultCause`, so this is a direct index, never a search.
pub fn lookup(cause: FaultCause) -> &'static CauseRow {
    &CAUSE_TABLE[cause as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_dense_and_self_indexing() {
        for (i, row) in CAUSE_TABLE.iter().enumerate() {
            assert_eq!(row.cause as usize, i);
        }
    }

    #[test]
    fn severity_bands_key_on_the_mapped_signal() {
        assert_eq!(FaultCause::PermfailFpgaSelftest.severity(), crate::debug::Severity::Flt);
        assert_eq!(FaultCause::BatteryWarn.severity(), crate::debug::Severity::Wng);
        assert_eq!(FaultCause::AdapterUnsupported.severity(), crate::debug::Severity::Err);
        // Shares the `Battery*` name prefix with `BatteryWarn` but maps to a
        // different signal, so it bands as Err rather than Wng.
        assert_eq!(FaultCause::BatteryIsLow.severity(), crate::debug::Severity::Err);
    }

    #[test]
    fn scenario_a_causes_map_to_distinct_signals() {
        assert_eq!(lookup(FaultCause::ReqrstFpgaSelftest).signal, SignalId::PReqRstSig);
        assert_eq!(lookup(FaultCause::BatteryIsLow).signal, SignalId::PBatteryLowSig);
    }

    #[test]
    fn scenario_b_causes_share_a_signal() {
        assert_eq!(lookup(FaultCause::ReqrstFpgaSelftest).signal, SignalId::PReqRstSig);
        assert_eq!(lookup(FaultCause::ReqrstMotorTest).signal, SignalId::PReqRstSig);
    }

    #[test]
    fn from_index_round_trips() {
        assert_eq!(FaultCause::from_index(0), Some(FaultCause::PermfailFpgaSelftest));
        assert_eq!(FaultCause::from_index(200), None);
    }
}
