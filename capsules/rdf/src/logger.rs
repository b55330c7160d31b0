//! The logger task: the single consumer that owns every RDF file handle
//! and performs the actual FAT operations, grounded on
//! `original_source/Rdf.c`'s `RdfProcessOpenSignal`/`RdfProcessDataSignal`/
//! `RdfProcessCloseSignal`.

use crate::manager::MAX_RECORDERS;
use crate::queue::LoggerEvent;
use fs::FsWrapper;
use kernel::errorcode::ErrorCode;
use kernel::hil::filesystem::{Filesystem, OpenMode};
use std::sync::mpsc::Receiver;

pub const FILE_TYPE_ID_RDF: u16 = 0x0020;
pub const MAJOR_REV: u8 = 1;
pub const MINOR_REV: u8 = 2;

/// Drains [`LoggerEvent`]s posted by every recorder and performs the
/// file operation each one names. One instance owns the filesystem and
/// every open RDF file handle, so writes from different motors are never
/// interleaved by anything but this loop's own ordering.
pub struct LoggerTask<F: Filesystem> {
    wrapper: FsWrapper<F>,
    handles: [Option<fs::FileHandle>; MAX_RECORDERS],
    rx: Receiver<LoggerEvent>,
}

impl<F: Filesystem> LoggerTask<F> {
    pub fn new(wrapper: FsWrapper<F>, rx: Receiver<LoggerEvent>) -> LoggerTask<F> {
        LoggerTask {
            wrapper,
            handles: [None, None, None],
            rx,
        }
    }

    /// Blocks until the channel is closed, processing one event at a
    /// time in posting order.
    pub fn run(&mut self) {
        while let Ok(event) = self.rx.recv() {
            self.process(event);
        }
    }

    /// Processes exactly one already-received event. Exposed separately
    /// from [`Self::run`] so tests can drive the task deterministically.
    pub fn process(&mut self, event: LoggerEvent) {
        match event {
            LoggerEvent::Open {
                motor,
                name,
                sample_rate_ms,
                headers,
            } => self.handle_open(motor, name, sample_rate_ms, headers),
            LoggerEvent::Data { motor, bytes } => self.handle_data(motor, &bytes),
            LoggerEvent::Close { motor } => self.handle_close(motor),
        }
    }

    fn handle_open(&mut self, motor: u8, name: String, sample_rate_ms: u32, headers: Vec<(String, u8)>) {
        let slot = motor as usize;
        if slot >= MAX_RECORDERS {
            return;
        }
        if self.handles[slot].is_some() {
            kernel::debug!("rdf: '{}' opened while a previous file is still open", name);
            return;
        }
        let mut handle = match self.wrapper.open(&name, OpenMode::WriteTruncate) {
            Ok(handle) => handle,
            Err(err) => {
                kernel::debug!("rdf: opening '{}' failed: {:?}", name, err);
                return;
            }
        };
        if let Err(err) = write_header(&mut handle, &name, motor, sample_rate_ms, &headers) {
            kernel::debug!("rdf: writing header for '{}' failed: {:?}", name, err);
            let _ = handle.close();
            return;
        }
        self.handles[slot] = Some(handle);
    }

    fn handle_data(&mut self, motor: u8, bytes: &[u8]) {
        let slot = motor as usize;
        if slot >= MAX_RECORDERS {
            return;
        }
        if let Some(handle) = self.handles[slot].as_mut() {
            if let Err(err) = handle.write(bytes) {
                kernel::debug!("rdf: writing sample for motor {} failed: {:?}", motor, err);
            }
        }
    }

    fn handle_close(&mut self, motor: u8) {
        let slot = motor as usize;
        if slot >= MAX_RECORDERS {
            return;
        }
        if let Some(handle) = self.handles[slot].take() {
            let _ = handle.close();
        }
    }
}

fn write_header(
    handle: &mut fs::FileHandle,
    name: &str,
    motor: u8,
    sample_rate_ms: u32,
    headers: &[(String, u8)],
) -> Result<(), ErrorCode> {
    handle
        .write_word(FILE_TYPE_ID_RDF)
        .map_err(|_| ErrorCode::FILESYSTEM)?;
    handle.write_byte(MAJOR_REV).map_err(|_| ErrorCode::FILESYSTEM)?;
    handle.write_byte(MINOR_REV).map_err(|_| ErrorCode::FILESYSTEM)?;

    handle
        .write_byte(name.len() as u8)
        .map_err(|_| ErrorCode::FILESYSTEM)?;
    handle
        .write(name.as_bytes())
        .map_err(|_| ErrorCode::FILESYSTEM)?;

    handle.write_byte(motor).map_err(|_| ErrorCode::FILESYSTEM)?;
    handle
        .write_long(sample_rate_ms)
        .map_err(|_| ErrorCode::FILESYSTEM)?;
    handle
        .write_byte(headers.len() as u8)
        .map_err(|_| ErrorCode::FILESYSTEM)?;

    for (var_name, var_type) in headers {
        handle
            .write_byte(var_name.len() as u8)
            .map_err(|_| ErrorCode::FILESYSTEM)?;
        handle
            .write(var_name.as_bytes())
            .map_err(|_| ErrorCode::FILESYSTEM)?;
        handle.write_byte(*var_type).map_err(|_| ErrorCode::FILESYSTEM)?;
        handle.write_byte(0).map_err(|_| ErrorCode::FILESYSTEM)?; // reserved for future compression use
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::hil::filesystem::{File, FsError};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Backing = Rc<RefCell<HashMap<String, Vec<u8>>>>;

    struct MemFile {
        path: String,
        backing: Backing,
        buf: Vec<u8>,
    }

    impl File for MemFile {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
        fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
            self.buf.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn close(self: Box<Self>) -> Result<(), FsError> {
            self.backing.borrow_mut().insert(self.path, self.buf);
            Ok(())
        }
    }

    struct MemFs {
        backing: Backing,
    }

    impl Filesystem for MemFs {
        fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn File>, FsError> {
            if mode == OpenMode::WriteTruncate {
                self.backing.borrow_mut().insert(path.to_string(), Vec::new());
            }
            Ok(Box::new(MemFile {
                path: path.to_string(),
                backing: self.backing.clone(),
                buf: Vec::new(),
            }))
        }
        fn delete(&mut self, path: &str) -> Result<(), FsError> {
            self.backing.borrow_mut().remove(path);
            Ok(())
        }
        fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError> {
            if let Some(data) = self.backing.borrow_mut().remove(old_path) {
                self.backing.borrow_mut().insert(new_path.to_string(), data);
            }
            Ok(())
        }
        fn free_space_bytes(&self) -> Result<u64, FsError> {
            Ok(1_000_000)
        }
    }

    #[test]
    fn open_then_data_then_close_writes_header_and_sample() {
        let backing: Backing = Rc::new(RefCell::new(HashMap::new()));
        let fs_backend = MemFs { backing: backing.clone() };
        let (_tx, rx) = std::sync::mpsc::sync_channel(1);
        let mut task = LoggerTask::new(FsWrapper::new(fs_backend, 1_000_000), rx);

        task.process(LoggerEvent::Open {
            motor: 0,
            name: "m0.rdf".to_string(),
            sample_rate_ms: 10,
            headers: vec![("00 Time".to_string(), 5)],
        });
        task.process(LoggerEvent::Data {
            motor: 0,
            bytes: vec![0x64, 0x00, 0x00, 0x00],
        });
        task.process(LoggerEvent::Close { motor: 0 });

        let written = backing.borrow().get("m0.rdf").cloned().unwrap();
        let expected_header_len = 2 + 1 + 1 + 1 + 6 + 1 + 4 + 1 + (1 + 7 + 1 + 1);
        assert_eq!(written.len(), expected_header_len + 4);
        assert_eq!(&written[written.len() - 4..], &[0x64, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn reopening_while_a_file_is_still_open_is_ignored() {
        let backing: Backing = Rc::new(RefCell::new(HashMap::new()));
        let fs_backend = MemFs { backing };
        let (_tx, rx) = std::sync::mpsc::sync_channel(1);
        let mut task = LoggerTask::new(FsWrapper::new(fs_backend, 1_000_000), rx);

        task.process(LoggerEvent::Open {
            motor: 0,
            name: "a.rdf".to_string(),
            sample_rate_ms: 10,
            headers: vec![],
        });
        task.process(LoggerEvent::Open {
            motor: 0,
            name: "b.rdf".to_string(),
            sample_rate_ms: 10,
            headers: vec![],
        });
        assert!(task.handles[0].is_some());
    }
}
