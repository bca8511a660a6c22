//! In-memory file system for exercising the probes without touching disk.
//!
//! Read-only files open fine for read-write access but reject every write
//! and truncate, which is how an immutable VFS import behaves.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{OpenMode, Vfs, VfsFile};

type Contents = Rc<RefCell<Vec<u8>>>;

#[derive(Default)]
struct Inner {
    files: HashMap<PathBuf, Contents>,
    read_only: HashSet<PathBuf>,
    /// Paths whose truncate reports success but leaves the data alone.
    lossy_truncate: HashSet<PathBuf>,
    /// Paths whose reads hand back `Z` in place of every byte.
    corrupt_reads: HashSet<PathBuf>,
    opens: usize,
    calls: Rc<Calls>,
}

/// Per-file-system tally of positioning and truncation calls.
#[derive(Default)]
struct Calls {
    truncates: Cell<usize>,
    seeks: Cell<usize>,
}

#[derive(Default, Clone)]
pub struct MemFs {
    inner: Rc<RefCell<Inner>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, data: &[u8]) {
        self.inner
            .borrow_mut()
            .files
            .insert(path.into(), Rc::new(RefCell::new(data.to_vec())));
    }

    pub fn insert_read_only(&self, path: impl Into<PathBuf>, data: &[u8]) {
        let path = path.into();
        self.insert(path.clone(), data);
        self.inner.borrow_mut().read_only.insert(path);
    }

    pub fn break_truncate(&self, path: impl Into<PathBuf>) {
        self.inner.borrow_mut().lossy_truncate.insert(path.into());
    }

    pub fn corrupt_reads(&self, path: impl Into<PathBuf>) {
        self.inner.borrow_mut().corrupt_reads.insert(path.into());
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.inner
            .borrow()
            .files
            .get(path)
            .map(|c| c.borrow().clone())
    }

    pub fn open_count(&self) -> usize {
        self.inner.borrow().opens
    }

    pub fn truncate_count(&self) -> usize {
        self.inner.borrow().calls.truncates.get()
    }

    pub fn seek_count(&self) -> usize {
        self.inner.borrow().calls.seeks.get()
    }
}

impl Vfs for MemFs {
    type File = MemFile;

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<MemFile> {
        let mut inner = self.inner.borrow_mut();
        inner.opens += 1;
        let existing = inner.files.get(path).cloned();
        let data = match existing {
            Some(c) => c,
            None if mode == OpenMode::ReadWriteCreate => {
                let c: Contents = Rc::default();
                inner.files.insert(path.to_path_buf(), Rc::clone(&c));
                c
            }
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        };
        Ok(MemFile {
            data,
            pos: 0,
            read_only: inner.read_only.contains(path),
            lossy_truncate: inner.lossy_truncate.contains(path),
            corrupt_reads: inner.corrupt_reads.contains(path),
            calls: Rc::clone(&inner.calls),
        })
    }
}

pub struct MemFile {
    data: Contents,
    pos: u64,
    read_only: bool,
    lossy_truncate: bool,
    corrupt_reads: bool,
    calls: Rc<Calls>,
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.borrow();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        if self.corrupt_reads {
            buf[..n].fill(b'Z');
        } else {
            buf[..n].copy_from_slice(&data[start..start + n]);
        }
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.read_only {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let mut data = self.data.borrow_mut();
        let start = self.pos as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.calls.seeks.set(self.calls.seeks.get() + 1);
        let len = self.data.borrow().len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(off) => len + off,
            SeekFrom::Current(off) => self.pos as i64 + off,
        };
        if target < 0 {
            return Err(io::Error::from(io::ErrorKind::InvalidInput));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl VfsFile for MemFile {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.calls.truncates.set(self.calls.truncates.get() + 1);
        if self.read_only {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if !self.lossy_truncate {
            self.data.borrow_mut().resize(len as usize, 0);
        }
        Ok(())
    }
}
