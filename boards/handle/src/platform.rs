//! Concrete stand-ins for the hardware this retrieval pack has no driver
//! for: a bench-condition I2C responder for the bus-master chip, a
//! `std::fs`-backed volume, and a logging watchdog. None of these claim to
//! be production drivers — a real board swaps each one out for a chip- or
//! OS-specific implementation behind the same `kernel::hil` traits.

use kernel::errorcode::ErrorCode;
use kernel::hil::filesystem::{File, Filesystem, FsError, OpenMode};
use kernel::hil::watchdog::WatchDog;
use onewire::i2c_bus::I2cBus;
use std::fs as stdfs;
use std::io::{Read, Seek, SeekFrom, Write as _};
use std::path::PathBuf;

/// Simulated bus-master register file: always reports the Covidien
/// manufacturer ID and an idle, device-absent status, since no real
/// DS2465-class chip is present on this bench. `onewire::regs` names the
/// registers this responds to.
pub struct SimI2cBus {
    registers: [u8; 256],
}

impl SimI2cBus {
    pub fn new() -> SimI2cBus {
        let mut registers = [0u8; 256];
        registers[onewire::regs::REG_MANUF_ID1 as usize] = onewire::regs::COVIDIEN_MANUF_ID1;
        registers[onewire::regs::REG_MANUF_ID2 as usize] = onewire::regs::COVIDIEN_MANUF_ID2;
        SimI2cBus { registers }
    }
}

impl Default for SimI2cBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cBus for SimI2cBus {
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ErrorCode> {
        self.registers[register as usize] = value;
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, ErrorCode> {
        Ok(self.registers[register as usize])
    }
}

/// A file opened against [`StdFilesystem`], backed by a real OS file
/// handle rather than the in-memory fakes the capsule unit tests use.
pub struct StdFile {
    handle: stdfs::File,
}

impl File for StdFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        self.handle.read(buf).map_err(|_| FsError::IoError)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
        self.handle.write(buf).map_err(|_| FsError::IoError)
    }

    fn close(self: Box<Self>) -> Result<(), FsError> {
        Ok(())
    }
}

/// A [`kernel::hil::filesystem::Filesystem`] rooted at a directory on the
/// host filesystem, standing in for the FAT volume `FileSys.c` wraps.
pub struct StdFilesystem {
    root: PathBuf,
}

impl StdFilesystem {
    pub fn new(root: PathBuf) -> Result<StdFilesystem, FsError> {
        stdfs::create_dir_all(&root).map_err(|_| FsError::IoError)?;
        Ok(StdFilesystem { root })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Filesystem for StdFilesystem {
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn File>, FsError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            stdfs::create_dir_all(parent).map_err(|_| FsError::IoError)?;
        }
        let mut options = stdfs::OpenOptions::new();
        match mode {
            OpenMode::Read => {
                options.read(true);
            }
            OpenMode::WriteTruncate => {
                options.write(true).create(true).truncate(true);
            }
            OpenMode::Append => {
                options.write(true).create(true).append(true);
            }
            OpenMode::ReadWrite => {
                options.read(true).write(true).create(true);
            }
        }
        let mut handle = options.open(&full).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                FsError::NotFound
            } else {
                FsError::IoError
            }
        })?;
        if matches!(mode, OpenMode::ReadWrite) {
            handle.seek(SeekFrom::Start(0)).map_err(|_| FsError::IoError)?;
        }
        Ok(Box::new(StdFile { handle }))
    }

    fn delete(&mut self, path: &str) -> Result<(), FsError> {
        stdfs::remove_file(self.resolve(path)).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                FsError::NotFound
            } else {
                FsError::IoError
            }
        })
    }

    fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError> {
        stdfs::rename(self.resolve(old_path), self.resolve(new_path)).map_err(|_| FsError::IoError)
    }

    fn free_space_bytes(&self) -> Result<u64, FsError> {
        // No portable `statvfs` in std; a fixed generous figure is enough
        // for the free-space monitor to exercise its threshold math on a
        // bench run rather than ever actually trip it.
        Ok(64 * 1024 * 1024)
    }
}

/// Logs instead of driving a real watchdog pin: no hardware watchdog
/// peripheral exists in this retrieval pack to program against.
#[derive(Default)]
pub struct LoggingWatchdog {
    armed_timeout_ms: Option<u32>,
}

impl WatchDog for LoggingWatchdog {
    fn start(&mut self, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.armed_timeout_ms = Some(timeout_ms);
        kernel::debug!("watchdog armed for {}ms", timeout_ms);
        Ok(())
    }

    fn kick(&mut self) {
        kernel::debug_trace!("watchdog kicked");
    }

    fn stop(&mut self) {
        self.armed_timeout_ms = None;
        kernel::debug!("watchdog stopped");
    }
}
