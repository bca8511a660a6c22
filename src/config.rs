//! User configuration: probe paths, payloads and datagram pacing.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/vfs-probes/config.toml` (default `~/.config/vfs-probes/config.toml`).
//! Command-line flags override whatever is loaded here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::net::datagram;

// ───────────────────────────────────────── config ────────────

/// Effective settings for every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Path the VFS serves read-only.
    pub immutable_path: PathBuf,
    /// Read-write file for the rewrite probe.
    pub target_path: PathBuf,
    pub append_path: PathBuf,
    pub append_delay_secs: u64,
    /// Literal written by the file probes.
    pub payload: String,
    pub udp_port: u16,
    pub udp_message: String,
    pub udp_interval_ms: u64,
    pub stat_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            immutable_path: PathBuf::from("/tmp/static"),
            target_path: PathBuf::from("/tmp/x"),
            append_path: PathBuf::from("/foobar"),
            append_delay_secs: 5,
            payload: "Hello!".into(),
            udp_port: datagram::DEFAULT_PORT,
            udp_message: datagram::DEFAULT_MESSAGE.into(),
            udp_interval_ms: datagram::DEFAULT_INTERVAL.as_millis() as u64,
            stat_path: PathBuf::from("/dev/log"),
        }
    }
}

impl ProbeConfig {
    pub fn append_delay(&self) -> Duration {
        Duration::from_secs(self.append_delay_secs)
    }

    pub fn udp_interval(&self) -> Duration {
        Duration::from_millis(self.udp_interval_ms)
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(path) {
                return Self::parse(&contents);
            }
            tracing::warn!(path = %path.display(), "config unreadable, using defaults");
        }
        Self::default()
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse(s: &str) -> Self {
        let mut cfg = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            // String settings.
            let text = match key {
                "immutable_path" | "target_path" | "append_path" | "stat_path" | "payload"
                | "udp_message" => match unquote(value) {
                    Some(text) => text,
                    None => {
                        tracing::warn!(key, value, "malformed quoted value, keeping default");
                        continue;
                    }
                },
                _ => String::new(),
            };

            match key {
                "immutable_path" => cfg.immutable_path = text.into(),
                "target_path" => cfg.target_path = text.into(),
                "append_path" => cfg.append_path = text.into(),
                "stat_path" => cfg.stat_path = text.into(),
                "payload" => cfg.payload = text,
                "udp_message" => cfg.udp_message = text,
                "append_delay_secs" => {
                    if let Ok(v) = value.parse() {
                        cfg.append_delay_secs = v;
                    }
                }
                "udp_port" => {
                    if let Ok(v) = value.parse() {
                        cfg.udp_port = v;
                    }
                }
                "udp_interval_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.udp_interval_ms = v.clamp(10, 60_000);
                    }
                }
                other => tracing::debug!(key = other, "ignoring unknown config key"),
            }
        }

        cfg
    }

    pub fn serialise(&self) -> String {
        let lines = [
            "# vfs-probes configuration".to_string(),
            String::new(),
            "# File probes".to_string(),
            format!("immutable_path = {}", quote(&self.immutable_path.to_string_lossy())),
            format!("target_path = {}", quote(&self.target_path.to_string_lossy())),
            format!("append_path = {}", quote(&self.append_path.to_string_lossy())),
            format!("append_delay_secs = {}", self.append_delay_secs),
            format!("payload = {}", quote(&self.payload)),
            format!("stat_path = {}", quote(&self.stat_path.to_string_lossy())),
            String::new(),
            "# Datagram pair".to_string(),
            format!("udp_port = {}", self.udp_port),
            format!("udp_message = {}", quote(&self.udp_message)),
            format!("udp_interval_ms = {}", self.udp_interval_ms),
            String::new(),
        ];
        lines.join("\n")
    }
}

/// Wrap `s` in double quotes, escaping backslashes, quotes and control whitespace so
/// the value survives the line-based parser unchanged.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Inverse of [`quote`].  Bare values are taken verbatim; a quoted value
/// with a bad escape or no closing quote yields `None`.
fn unquote(value: &str) -> Option<String> {
    let Some(body) = value.strip_prefix('"') else {
        return Some(value.to_string());
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return chars.as_str().trim().is_empty().then_some(out),
            '\\' => out.push(match chars.next()? {
                '\\' => '\\',
                '"' => '"',
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                _ => return None,
            }),
            c => out.push(c),
        }
    }
    None
}

/// Return the config file path (`$XDG_CONFIG_HOME/vfs-probes/config.toml`).
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml")
}
