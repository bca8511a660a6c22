//! The host file system, via `std::fs`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use super::{OpenMode, Vfs, VfsFile};

#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl Vfs for HostFs {
    type File = File;

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(mode == OpenMode::ReadWriteCreate)
            .truncate(false)
            .open(path)
    }
}

impl VfsFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use super::*;

    #[test]
    fn plain_open_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let err = HostFs.open(&path, OpenMode::ReadWrite).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!path.exists());
    }

    #[test]
    fn create_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, "abc").unwrap();

        let mut f = HostFs.open(&path, OpenMode::ReadWriteCreate).unwrap();
        let mut s = String::new();
        f.read_to_string(&mut s).unwrap();
        assert_eq!(s, "abc");
    }

    #[test]
    fn truncate_then_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, "longer content").unwrap();

        let mut f = HostFs.open(&path, OpenMode::ReadWrite).unwrap();
        VfsFile::truncate(&mut f, 0).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();
        f.write_all(b"hi").unwrap();
        drop(f);

        assert_eq!(std::fs::read(&path).unwrap(), b"hi");
    }
}
