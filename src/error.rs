//! Typed probe failures.
//!
//! Every variant names the operation that failed so the diagnostic printed
//! on exit tells the user exactly which step broke.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unable to open file '{}'", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to read from file '{}'", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("unable to write to file '{}'", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("unable to truncate file '{}'", path.display())]
    Truncate { path: PathBuf, source: io::Error },

    #[error("unable to seek in file '{}' ({what})", path.display())]
    Seek {
        path: PathBuf,
        what: &'static str,
        source: io::Error,
    },

    #[error("unable to stat '{}'", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("unexpectedly wrote {bytes} bytes to read-only file '{}'", path.display())]
    UnexpectedWrite { path: PathBuf, bytes: usize },

    #[error("file '{}' holds {actual} bytes after rewrite, expected {expected}", path.display())]
    LengthMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("file '{}' read back different content than was written", path.display())]
    ContentMismatch { path: PathBuf },

    #[error("payload of {len} bytes does not fit the {max}-byte read buffer")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("unable to open datagram socket")]
    Socket(#[source] io::Error),

    #[error("bind to {addr} failed")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("invalid peer address '{0}'")]
    InvalidPeer(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
