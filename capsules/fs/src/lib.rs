//! Filesystem wrapper: instrumented file handles, free-space monitoring,
//! and the hex/ascii helpers KVF and RDF both need for human-readable
//! logging of binary records.

pub mod handle;
pub mod helpers;
pub mod space;
pub mod wrapper;

pub use handle::{FileHandle, FileStats};
pub use wrapper::FsWrapper;
