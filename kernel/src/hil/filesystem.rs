//! POSIX-ish filesystem interface the filesystem wrapper, KVF, and RDF
//! capsules program against, standing in for a concrete
//! FAT volume driver the way `FsOpen`/`FsRead`/`FsWrite`/`FsClose` in
//! `FileSys.h` stand in for the underlying FAT stack.

use crate::errorcode::ErrorCode;

/// Open-mode flags, matching the `FS_MODE_*` combinations (read,
/// write-create-truncate, append-create).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    WriteTruncate,
    Append,
    ReadWrite,
}

/// A small closed taxonomy of underlying FAT failure kinds: KVF's
/// `file_system` error and RDF's failure reporting both need to tell
/// "disk full" (triggers a cleanup task) apart from "corrupt" (escalates
/// to the fault aggregator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    NotFound,
    Full,
    Corrupt,
    Busy,
    IoError,
}

impl From<FsError> for ErrorCode {
    fn from(err: FsError) -> ErrorCode {
        match err {
            FsError::NotFound => ErrorCode::FILEDOESNOTEXIST,
            FsError::Full | FsError::Corrupt | FsError::Busy | FsError::IoError => {
                ErrorCode::FILESYSTEM
            }
        }
    }
}

/// An open file handle.
pub trait File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError>;
    fn close(self: Box<Self>) -> Result<(), FsError>;
}

/// The underlying volume capsules open files against.
pub trait Filesystem {
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Box<dyn File>, FsError>;
    fn delete(&mut self, path: &str) -> Result<(), FsError>;
    fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError>;

    /// Free space remaining, in bytes, used by the free-space monitor to
    /// trigger its cleanup task.
    fn free_space_bytes(&self) -> Result<u64, FsError>;
}
