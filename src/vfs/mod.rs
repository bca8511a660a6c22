//! File-system seam used by the file probes.
//!
//! Probes talk to a [`Vfs`] rather than to `std::fs` directly so the same
//! step sequence runs against the host file system or an in-memory layer.

pub mod host;
#[cfg(test)]
pub mod mem;

use std::io::{self, Read, Seek, Write};
use std::path::Path;

pub use host::HostFs;

/// How a probe wants a file opened.  Both modes grant read and write access
/// and neither truncates existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// The file must already exist.
    ReadWrite,
    /// Create the file if it is absent.
    ReadWriteCreate,
}

/// An open file handle with POSIX-style read/write/seek/truncate.
pub trait VfsFile: Read + Write + Seek {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

/// Something that can open files by path.
pub trait Vfs {
    type File: VfsFile;

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<Self::File>;
}
