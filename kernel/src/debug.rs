//! A small logging façade standing in for tock's `kernel::debug!`, which
//! formats to a ring buffer drained over UART rather than to `stdout`. Every
//! subsystem in this workspace logs through the same [`Writer`] so the board
//! crate can redirect it (to a UART ring buffer on real hardware, to
//! `stdout` in the default `StdoutWriter` used by tests and by the example
//! board wiring) without each capsule depending on a concrete sink.

use core::fmt;
use std::sync::Mutex;

/// Severity band a message is logged at. The fault aggregator maps fault
/// causes onto these three bands: permanent failures log
/// `Flt`, battery warnings log `Wng`, everything else logs `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Permanent failure requiring a reset-request.
    Flt,
    /// Warning; continued operation is still allowed.
    Wng,
    /// Ordinary error-level diagnostic.
    Err,
    /// Debug-level trace, e.g. a rejected out-of-range fault cause.
    Dbg,
}

/// A destination for formatted log lines.
pub trait Writer: Send {
    fn write_line(&mut self, severity: Severity, line: &str);
}

/// Writer used when no board-specific sink has been installed: formats to
/// stdout, prefixed with the severity band.
pub struct StdoutWriter;

impl Writer for StdoutWriter {
    fn write_line(&mut self, severity: Severity, line: &str) {
        println!("[{:?}] {}", severity, line);
    }
}

static GLOBAL_WRITER: Mutex<Option<Box<dyn Writer>>> = Mutex::new(None);

/// Installs the process-wide log sink. Boards call this once during start
/// up; absent a call, log lines go to [`StdoutWriter`].
pub fn set_writer(writer: Box<dyn Writer>) {
    *GLOBAL_WRITER.lock().unwrap() = Some(writer);
}

#[doc(hidden)]
pub fn log_fmt(severity: Severity, args: fmt::Arguments<'_>) {
    let line = fmt::format(args);
    let mut guard = GLOBAL_WRITER.lock().unwrap();
    match guard.as_mut() {
        Some(writer) => writer.write_line(severity, &line),
        None => StdoutWriter.write_line(severity, &line),
    }
}

/// Logs at [`Severity::Err`], tock's ordinary `debug!` level.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::debug::log_fmt($crate::debug::Severity::Err, format_args!($($arg)*))
    };
}

/// Logs at [`Severity::Flt`] — a permanent failure
#[macro_export]
macro_rules! debug_flt {
    ($($arg:tt)*) => {
        $crate::debug::log_fmt($crate::debug::Severity::Flt, format_args!($($arg)*))
    };
}

/// Logs at [`Severity::Wng`] — a battery-style warning
#[macro_export]
macro_rules! debug_wng {
    ($($arg:tt)*) => {
        $crate::debug::log_fmt($crate::debug::Severity::Wng, format_args!($($arg)*))
    };
}

/// Logs at [`Severity::Dbg`] — rejected/out-of-range conditions that are
/// not themselves faults, per the fault aggregator's invariant that a
/// cause outside the enumerated range is silently rejected with a debug
/// log.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        $crate::debug::log_fmt($crate::debug::Severity::Dbg, format_args!($($arg)*))
    };
}
