//! The filesystem wrapper capsules open files against: POSIX-style
//! open-mode mapping onto [`kernel::hil::filesystem::Filesystem`], wrapped
//! files returned as instrumented [`FileHandle`]s, and the free-space
//! monitor from `original_source/FileSys.c`'s startup volume check.

use crate::handle::FileHandle;
use crate::space;
use kernel::hil::filesystem::{Filesystem, FsError, OpenMode};

/// Wraps a concrete volume backend with instrumentation and the
/// free-space monitor. `total_bytes` is the volume's fixed capacity,
/// which the underlying `Filesystem` trait has no notion of (it only
/// reports free space) so the wrapper is told it once at construction.
pub struct FsWrapper<F: Filesystem> {
    backend: F,
    total_bytes: u64,
}

impl<F: Filesystem> FsWrapper<F> {
    pub fn new(backend: F, total_bytes: u64) -> FsWrapper<F> {
        FsWrapper {
            backend,
            total_bytes,
        }
    }

    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle, FsError> {
        let file = self.backend.open(path, mode)?;
        Ok(FileHandle::new(file))
    }

    pub fn delete(&mut self, path: &str) -> Result<(), FsError> {
        self.backend.delete(path)
    }

    pub fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError> {
        self.backend.rename(old_path, new_path)
    }

    /// Runs the free-space check and returns how many bytes a cleanup
    /// task should reclaim, if any.
    pub fn check_free_space(&self) -> Result<Option<u64>, FsError> {
        let free_bytes = self.backend.free_space_bytes()?;
        Ok(space::bytes_to_reclaim(self.total_bytes, free_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::hil::filesystem::File;
    use std::collections::HashMap;

    struct FakeFile;
    impl File for FakeFile {
        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
        fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
            Ok(buf.len())
        }
        fn close(self: Box<Self>) -> Result<(), FsError> {
            Ok(())
        }
    }

    struct FakeVolume {
        free_bytes: u64,
        deleted: Vec<String>,
        renamed: HashMap<String, String>,
    }

    impl Filesystem for FakeVolume {
        fn open(&mut self, _path: &str, _mode: OpenMode) -> Result<Box<dyn File>, FsError> {
            Ok(Box::new(FakeFile))
        }
        fn delete(&mut self, path: &str) -> Result<(), FsError> {
            self.deleted.push(path.to_string());
            Ok(())
        }
        fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), FsError> {
            self.renamed.insert(old_path.to_string(), new_path.to_string());
            Ok(())
        }
        fn free_space_bytes(&self) -> Result<u64, FsError> {
            Ok(self.free_bytes)
        }
    }

    #[test]
    fn open_returns_an_instrumented_handle() {
        let volume = FakeVolume {
            free_bytes: 1_000,
            deleted: Vec::new(),
            renamed: HashMap::new(),
        };
        let mut wrapper = FsWrapper::new(volume, 10_000);
        let mut handle = wrapper.open("rdf/0001.rdf", OpenMode::WriteTruncate).unwrap();
        handle.write(b"hello").unwrap();
        assert_eq!(handle.stats().bytes_written, 5);
    }

    #[test]
    fn delete_and_rename_pass_through() {
        let volume = FakeVolume {
            free_bytes: 1_000,
            deleted: Vec::new(),
            renamed: HashMap::new(),
        };
        let mut wrapper = FsWrapper::new(volume, 10_000);
        wrapper.delete("old.rdf").unwrap();
        wrapper.rename("a.kvf", "b.kvf").unwrap();
        assert_eq!(wrapper.backend.deleted, vec!["old.rdf".to_string()]);
        assert_eq!(
            wrapper.backend.renamed.get("a.kvf"),
            Some(&"b.kvf".to_string())
        );
    }

    #[test]
    fn low_free_space_is_surfaced_through_the_wrapper() {
        let volume = FakeVolume {
            free_bytes: 100,
            deleted: Vec::new(),
            renamed: HashMap::new(),
        };
        let wrapper = FsWrapper::new(volume, 10_000);
        assert!(wrapper.check_free_space().unwrap().is_some());
    }
}
