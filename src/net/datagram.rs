//! UDP send/receive pair.
//!
//! The sender fires a fixed NUL-terminated message at a peer on every tick;
//! the receiver binds the well-known port and prints whatever arrives.
//! Both loop forever unless given an iteration count.

use std::fmt;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::error::{ProbeError, ProbeResult};

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_MESSAGE: &str = "Hi, there!";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const RECV_BUF_SIZE: usize = 128;

/// Pacing shared by both loops.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub interval: Duration,
    /// Stop after this many iterations; `None` runs forever.
    pub count: Option<u64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            count: None,
        }
    }
}

impl LoopOptions {
    fn done(&self, iterations: u64) -> bool {
        self.count.is_some_and(|n| iterations >= n)
    }
}

/// Line sink for loop output.  Only the first write error is logged and the
/// loop carries on regardless.
struct Report<'a, W: Write> {
    out: &'a mut W,
    broken: bool,
}

impl<'a, W: Write> Report<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self { out, broken: false }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        let res = self
            .out
            .write_fmt(args)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(e) = res {
            if !self.broken {
                tracing::error!(error = %e, "unable to write loop output");
                self.broken = true;
            }
        }
    }
}

/// Wire form of `message`: its bytes plus a trailing NUL.
pub fn payload(message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.len() + 1);
    bytes.extend_from_slice(message.as_bytes());
    bytes.push(0);
    bytes
}

/// Parse a dotted-quad peer address and pair it with `port`.
pub fn peer_addr(peer: &str, port: u16) -> ProbeResult<SocketAddr> {
    let ip: Ipv4Addr = peer
        .trim()
        .parse()
        .map_err(|_| ProbeError::InvalidPeer(peer.to_string()))?;
    Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

/// Open a socket for sending, bound to an ephemeral port.
pub async fn open_sender() -> ProbeResult<UdpSocket> {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(ProbeError::Socket)
}

/// Bind `0.0.0.0:port` for receiving.
pub async fn open_receiver(port: u16) -> ProbeResult<UdpSocket> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    UdpSocket::bind(addr)
        .await
        .map_err(|source| ProbeError::Bind { addr, source })
}

/// Send `payload` to `peer` once per interval.  Send failures are reported
/// and the loop moves on to the next tick.  Returns the number of successful sends.
pub async fn send_loop<W: Write>(
    socket: &UdpSocket,
    peer: SocketAddr,
    payload: &[u8],
    opts: LoopOptions,
    out: &mut W,
) -> u64 {
    let mut report = Report::new(out);
    let mut iterations = 0;
    let mut sent = 0;
    loop {
        match socket.send_to(payload, peer).await {
            Ok(bytes) => {
                sent += 1;
                report.line(format_args!("Sent message with {bytes} bytes"));
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "send failed");
                report.line(format_args!("Send failed: {e}"));
            }
        }
        iterations += 1;
        if opts.done(iterations) {
            break;
        }
        tokio::time::sleep(opts.interval).await;
    }
    sent
}

/// Receive and print datagrams, pausing one interval after each attempt.
/// Returns the number of non-empty messages received.
pub async fn recv_loop<W: Write>(socket: &UdpSocket, opts: LoopOptions, out: &mut W) -> u64 {
    let mut report = Report::new(out);
    let mut buf = [0u8; RECV_BUF_SIZE];
    let mut iterations = 0;
    let mut received = 0;
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((bytes, from)) if bytes > 0 => {
                received += 1;
                tracing::debug!(%from, bytes, "datagram received");
                let text = until_nul(&buf[..bytes]);
                report.line(format_args!("Received message with: {text}"));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "receive failed");
                report.line(format_args!("Receive failed: {e}"));
            }
        }
        iterations += 1;
        if opts.done(iterations) {
            break;
        }
        tokio::time::sleep(opts.interval).await;
    }
    received
}

fn until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
