//! Small probes for VFS file semantics and a UDP send/receive pair.
//!
//! Each subcommand runs one probe, prints what it observed on stdout and
//! exits non-zero on the first unexpected result.  Logs go to stderr and are
//! controlled by `RUST_LOG`.

mod config;
mod error;
mod net;
mod probe;
mod vfs;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::ProbeConfig;
use crate::net::datagram::{self, LoopOptions};
use crate::probe::{append, import, stat};
use crate::vfs::HostFs;

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "VFS and datagram probes")]
struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the immutable file rejects writes, then rewrite the target.
    Import {
        /// Path the VFS serves read-only.
        #[arg(long)]
        immutable: Option<PathBuf>,
        /// Read-write file to truncate and rewrite.
        #[arg(long)]
        target: Option<PathBuf>,
        #[arg(long)]
        payload: Option<String>,
    },

    /// Create a file, wait, then reopen it and append at end-of-file.
    Append {
        path: Option<PathBuf>,
        /// Seconds to wait before reopening.
        #[arg(long)]
        delay: Option<u64>,
        #[arg(long)]
        payload: Option<String>,
    },

    /// Print a greeting and stat a path.
    Hello { path: Option<PathBuf> },

    /// Send the datagram message to a peer on every tick.
    Sendto {
        /// IPv4 address of the receiving peer.
        peer: String,
        #[command(flatten)]
        net: NetArgs,
        #[arg(long)]
        message: Option<String>,
    },

    /// Bind the datagram port and print every message received.
    Recvfrom {
        /// Accepted for symmetry with `sendto`; unused.
        peer: Option<String>,
        #[command(flatten)]
        net: NetArgs,
    },

    /// Print the effective configuration.
    Config {
        /// Also write it back to the file it was loaded from.
        #[arg(long)]
        save: bool,
    },
}

#[derive(clap::Args, Debug)]
struct NetArgs {
    #[arg(long)]
    port: Option<u16>,
    /// Milliseconds between iterations.
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Stop after this many iterations (default: run forever).
    #[arg(long)]
    count: Option<u64>,
}

impl NetArgs {
    fn port(&self, cfg: &ProbeConfig) -> u16 {
        self.port.unwrap_or(cfg.udp_port)
    }

    fn loop_options(&self, cfg: &ProbeConfig) -> LoopOptions {
        LoopOptions {
            interval: self
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| cfg.udp_interval()),
            count: self.count,
        }
    }
}

// ───────────────────────────────────────── runners ───────────

fn run_import(
    cfg: &ProbeConfig,
    immutable: Option<PathBuf>,
    target: Option<PathBuf>,
    payload: Option<String>,
) -> Result<()> {
    let immutable = immutable.unwrap_or_else(|| cfg.immutable_path.clone());
    let target = target.unwrap_or_else(|| cfg.target_path.clone());
    let payload = payload.unwrap_or_else(|| cfg.payload.clone());

    let report = import::run(&HostFs, &immutable, &target, payload.as_bytes())?;

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "Unable to write to file '{}' ({:?}), this is expected.",
        report.immutable_path.display(),
        report.rejected_with
    )?;
    writeln!(
        out,
        "Read {} bytes from {}:\n{}",
        report.before.len(),
        report.target_path.display(),
        String::from_utf8_lossy(&report.before)
    )?;
    if report.truncated() {
        writeln!(out, "Truncated {}", report.target_path.display())?;
    }
    writeln!(out, "Wrote {} bytes to {}", report.written, report.target_path.display())?;
    writeln!(
        out,
        "Read {} bytes from {}:\n{}",
        report.after.len(),
        report.target_path.display(),
        String::from_utf8_lossy(&report.after)
    )?;
    Ok(())
}

async fn run_append(
    cfg: &ProbeConfig,
    path: Option<PathBuf>,
    delay: Option<u64>,
    payload: Option<String>,
) -> Result<()> {
    let path = path.unwrap_or_else(|| cfg.append_path.clone());
    let delay = delay.map(Duration::from_secs).unwrap_or_else(|| cfg.append_delay());
    let payload = payload.unwrap_or_else(|| cfg.payload.clone());

    let report = append::run(&HostFs, &path, payload.as_bytes(), delay).await?;
    println!(
        "Created {} with {} bytes, appended {} bytes at offset {}",
        report.path.display(),
        report.created_bytes,
        report.appended_bytes,
        report.end_offset
    );
    Ok(())
}

fn run_hello(cfg: &ProbeConfig, path: Option<PathBuf>) -> Result<()> {
    println!("{}", stat::GREETING);
    let path = path.unwrap_or_else(|| cfg.stat_path.clone());
    let report = stat::run(&path)?;
    println!("{}: {}", report.path.display(), report.kind);
    println!("inode: {}", report.inode);
    Ok(())
}

async fn run_sendto(
    cfg: &ProbeConfig,
    peer: &str,
    net: &NetArgs,
    message: Option<String>,
) -> Result<()> {
    let peer = datagram::peer_addr(peer, net.port(cfg))?;
    let message = message.unwrap_or_else(|| cfg.udp_message.clone());
    let payload = datagram::payload(&message);

    let socket = datagram::open_sender().await?;
    tracing::info!(%peer, bytes = payload.len(), "sending");
    let sent = datagram::send_loop(
        &socket,
        peer,
        &payload,
        net.loop_options(cfg),
        &mut io::stdout(),
    )
    .await;
    tracing::info!(sent, "sender stopped");
    Ok(())
}

async fn run_recvfrom(cfg: &ProbeConfig, net: &NetArgs) -> Result<()> {
    let socket = datagram::open_receiver(net.port(cfg)).await?;
    tracing::info!(addr = ?socket.local_addr().ok(), "listening");
    let received = datagram::recv_loop(&socket, net.loop_options(cfg), &mut io::stdout()).await;
    tracing::info!(received, "receiver stopped");
    Ok(())
}

fn run_config(cfg: &ProbeConfig, save_to: Option<&Path>) -> Result<()> {
    print!("{}", cfg.serialise());
    if let Some(path) = save_to {
        cfg.save_to(path)?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (silent unless RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // stdout carries probe output
        .init();

    let cli = Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = ProbeConfig::load_from(&config_file);
    tracing::debug!(?cfg, "effective config");

    match cli.command {
        Command::Import {
            immutable,
            target,
            payload,
        } => run_import(&cfg, immutable, target, payload),
        Command::Append {
            path,
            delay,
            payload,
        } => run_append(&cfg, path, delay, payload).await,
        Command::Hello { path } => run_hello(&cfg, path),
        Command::Sendto { peer, net, message } => run_sendto(&cfg, &peer, &net, message).await,
        Command::Recvfrom { peer, net } => {
            if let Some(peer) = peer {
                tracing::debug!(%peer, "peer argument ignored in receive mode");
            }
            run_recvfrom(&cfg, &net).await
        }
        Command::Config { save } => run_config(&cfg, save.then_some(config_file.as_path())),
    }
}
