//! Greeting plus a single `stat` of a path.

use std::fs::{self, FileType};
use std::path::{Path, PathBuf};

use crate::error::{ProbeError, ProbeResult};

pub const GREETING: &str = "Hello Genode Rust world!";

#[derive(Debug, Clone)]
pub struct StatReport {
    pub path: PathBuf,
    pub kind: &'static str,
    pub inode: u64,
}

pub fn run(path: &Path) -> ProbeResult<StatReport> {
    let meta = fs::metadata(path).map_err(|source| ProbeError::Stat {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(StatReport {
        path: path.to_path_buf(),
        kind: describe(meta.file_type()),
        inode: inode(&meta),
    })
}

#[cfg(unix)]
fn describe(ft: FileType) -> &'static str {
    use std::os::unix::fs::FileTypeExt;
    if ft.is_dir() {
        "directory"
    } else if ft.is_file() {
        "regular file"
    } else if ft.is_symlink() {
        "symlink"
    } else if ft.is_char_device() {
        "character device"
    } else if ft.is_block_device() {
        "block device"
    } else if ft.is_fifo() {
        "fifo"
    } else if ft.is_socket() {
        "socket"
    } else {
        "unknown"
    }
}

#[cfg(not(unix))]
fn describe(ft: FileType) -> &'static str {
    if ft.is_dir() {
        "directory"
    } else if ft.is_file() {
        "regular file"
    } else if ft.is_symlink() {
        "symlink"
    } else {
        "unknown"
    }
}

#[cfg(unix)]
fn inode(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn inode(_meta: &fs::Metadata) -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_regular_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("log");
        std::fs::write(&file, "x").unwrap();

        let report = run(&file).unwrap();
        assert_eq!(report.kind, "regular file");
        #[cfg(unix)]
        assert_ne!(report.inode, 0);

        assert_eq!(run(dir.path()).unwrap().kind, "directory");
    }

    #[test]
    fn missing_path_is_a_stat_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ProbeError::Stat { .. }));
        assert!(err.to_string().contains("nope"));
    }
}
