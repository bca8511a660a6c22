//! Read-only import and read-modify-truncate-rewrite probe.
//!
//! First checks that the VFS refuses writes to an immutable file, then
//! rewrites a regular file and reads it back to confirm length and content.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ProbeError, ProbeResult};
use crate::vfs::{OpenMode, Vfs, VfsFile};

/// Size of the scratch buffer; at most `BUF_SIZE - 1` bytes are read.
pub const BUF_SIZE: usize = 128;

/// Longest payload whose read-back fits the scratch buffer.
pub const MAX_PAYLOAD: usize = BUF_SIZE - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub immutable_path: PathBuf,
    pub target_path: PathBuf,
    /// The error the VFS returned for the immutable write.
    pub rejected_with: ErrorKind,
    /// Content found in the target before rewriting.
    pub before: Vec<u8>,
    pub written: usize,
    /// Content read back after rewriting.
    pub after: Vec<u8>,
}

impl ImportReport {
    pub fn truncated(&self) -> bool {
        !self.before.is_empty()
    }
}

pub fn run<V: Vfs>(
    vfs: &V,
    immutable_path: &Path,
    target_path: &Path,
    payload: &[u8],
) -> ProbeResult<ImportReport> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProbeError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let rejected_with = expect_write_rejected(vfs, immutable_path, payload)?;
    tracing::info!(
        path = %immutable_path.display(),
        error = ?rejected_with,
        "write to immutable file rejected, as expected"
    );

    let mut file = vfs
        .open(target_path, OpenMode::ReadWriteCreate)
        .map_err(|source| ProbeError::Open {
            path: target_path.to_path_buf(),
            source,
        })?;

    let before = read_some(&mut file, target_path)?;
    tracing::debug!(bytes = before.len(), "read existing content");

    if !before.is_empty() {
        file.truncate(0).map_err(|source| ProbeError::Truncate {
            path: target_path.to_path_buf(),
            source,
        })?;
        rewind(&mut file, target_path, "to beginning")?;
    }

    file.write_all(payload).map_err(|source| ProbeError::Write {
        path: target_path.to_path_buf(),
        source,
    })?;
    let written = payload.len();
    tracing::debug!(bytes = written, "rewrote target");

    rewind(&mut file, target_path, "before read-back")?;
    let after = read_some(&mut file, target_path)?;

    if after.len() != written {
        return Err(ProbeError::LengthMismatch {
            path: target_path.to_path_buf(),
            expected: written,
            actual: after.len(),
        });
    }
    if after != payload {
        return Err(ProbeError::ContentMismatch {
            path: target_path.to_path_buf(),
        });
    }

    Ok(ImportReport {
        immutable_path: immutable_path.to_path_buf(),
        target_path: target_path.to_path_buf(),
        rejected_with,
        before,
        written,
        after,
    })
}

/// Open `path` read-write and try one write.  Returns the error kind on
/// rejection; a successful write is the failure case.
fn expect_write_rejected<V: Vfs>(vfs: &V, path: &Path, payload: &[u8]) -> ProbeResult<ErrorKind> {
    let mut file = vfs
        .open(path, OpenMode::ReadWrite)
        .map_err(|source| ProbeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    match file.write(payload) {
        Ok(bytes) => Err(ProbeError::UnexpectedWrite {
            path: path.to_path_buf(),
            bytes,
        }),
        Err(e) => Ok(e.kind()),
    }
}

/// Read until EOF or until the buffer (less one byte) is full.
fn read_some<F: Read>(file: &mut F, path: &Path) -> ProbeResult<Vec<u8>> {
    let mut buf = [0u8; BUF_SIZE];
    let cap = MAX_PAYLOAD;
    let mut len = 0;
    while len < cap {
        match file.read(&mut buf[len..cap]) {
            Ok(0) => break,
            Ok(n) => len += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ProbeError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(buf[..len].to_vec())
}

fn rewind<F: Seek>(file: &mut F, path: &Path, what: &'static str) -> ProbeResult<()> {
    file.seek(SeekFrom::Start(0))
        .map(|_| ())
        .map_err(|source| ProbeError::Seek {
            path: path.to_path_buf(),
            what,
            source,
        })
}
