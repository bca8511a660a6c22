//! Create, wait, reopen and append at end-of-file.
//!
//! Only call failures are checked; the final content is never read back.

use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProbeError, ProbeResult};
use crate::vfs::{OpenMode, Vfs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub path: PathBuf,
    pub created_bytes: usize,
    /// Offset reported by the seek to end-of-file after the delay.
    pub end_offset: u64,
    pub appended_bytes: usize,
}

pub async fn run<V: Vfs>(
    vfs: &V,
    path: &Path,
    payload: &[u8],
    delay: Duration,
) -> ProbeResult<AppendReport> {
    {
        let mut file = open(vfs, path, OpenMode::ReadWriteCreate)?;
        write(&mut file, path, payload)?;
    }
    tracing::info!(path = %path.display(), bytes = payload.len(), "created file");

    tracing::debug!(?delay, "waiting before reopen");
    tokio::time::sleep(delay).await;

    let mut file = open(vfs, path, OpenMode::ReadWrite)?;
    let end_offset = file
        .seek(SeekFrom::End(0))
        .map_err(|source| ProbeError::Seek {
            path: path.to_path_buf(),
            what: "to end",
            source,
        })?;
    write(&mut file, path, payload)?;
    tracing::info!(path = %path.display(), offset = end_offset, "appended");

    Ok(AppendReport {
        path: path.to_path_buf(),
        created_bytes: payload.len(),
        end_offset,
        appended_bytes: payload.len(),
    })
}

fn open<V: Vfs>(vfs: &V, path: &Path, mode: OpenMode) -> ProbeResult<V::File> {
    vfs.open(path, mode).map_err(|source| ProbeError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn write<F: Write>(file: &mut F, path: &Path, payload: &[u8]) -> ProbeResult<()> {
    file.write_all(payload).map_err(|source| ProbeError::Write {
        path: path.to_path_buf(),
        source,
    })
}
