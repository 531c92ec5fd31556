//! Per-connection diagnostic output.
//!
//! A [`DebugSink`] is handed to every record-layer component at
//! construction. Each category is switched on separately and is written
//! through the `log` facade under its own target, so it can also be
//! filtered by the logger.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

pub const TARGET_RECORD: &str = "tlsrec::record";
pub const TARGET_HANDSHAKE: &str = "tlsrec::handshake";
pub const TARGET_PLAINTEXT: &str = "tlsrec::plaintext";
pub const TARGET_PACKET: &str = "tlsrec::packet";

/// Diagnostic categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    /// Record boundaries, epoch changes, alerts.
    pub record: bool,
    /// Handshake message boundaries seen by the record layer.
    pub handshake: bool,
    /// Hex dumps of plaintext before sealing and after opening.
    pub plaintext: bool,
    /// Hex dumps of raw packets read and written.
    pub packet: bool,
}

impl DebugFlags {
    pub fn all() -> Self {
        Self {
            record: true,
            handshake: true,
            plaintext: true,
            packet: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.record || self.handshake || self.plaintext || self.packet
    }
}

#[derive(Debug, Clone)]
pub struct DebugSink {
    flags: DebugFlags,
    label: Arc<str>,
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DebugSink {
    pub fn new(flags: DebugFlags, label: impl Into<Arc<str>>) -> Self {
        Self {
            flags,
            label: label.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(DebugFlags::none(), "")
    }

    pub fn flags(&self) -> DebugFlags {
        self.flags
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn record(&self, args: fmt::Arguments<'_>) {
        if self.flags.record {
            log::debug!(target: TARGET_RECORD, "{}, {}", self.label, args);
        }
    }

    pub fn handshake(&self, args: fmt::Arguments<'_>) {
        if self.flags.handshake {
            log::debug!(target: TARGET_HANDSHAKE, "{}, {}", self.label, args);
        }
    }

    pub fn plaintext(&self, what: &str, data: &[u8]) {
        if self.flags.plaintext {
            log::trace!(
                target: TARGET_PLAINTEXT,
                "{}, {what}: length = {}\n{}",
                self.label,
                data.len(),
                hex_dump(data)
            );
        }
    }

    pub fn packet(&self, what: &str, data: &[u8]) {
        if self.flags.packet {
            log::trace!(
                target: TARGET_PACKET,
                "[{what}]: length = {}\n{}",
                data.len(),
                hex_dump(data)
            );
        }
    }
}

/// Format `data` as offset-prefixed lines of 16 hex bytes.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / 16 * 6);
    for (i, line) in data.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:04X}:", i * 16);
        for b in line {
            let _ = write!(out, " {b:02X}");
        }
    }
    out
}
