//! Record layer configuration with builder pattern.

use tlsrec_types::{ProtocolVersion, TlsError};

use crate::debug::{DebugFlags, DebugSink};
use crate::record::limits::{MAX_DATA_SIZE, MAX_LARGE_RECORD_SIZE, MAX_RECORD_SIZE};

/// Record layer configuration.
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Lowest record version accepted from the peer.
    pub min_version: ProtocolVersion,
    /// Highest record version; the peer's major version may not exceed it.
    pub max_version: ProtocolVersion,
    /// Largest plaintext fragment written per record.
    pub max_fragment_size: usize,
    /// Accept an SSLv2-format ClientHello and convert it.
    pub enable_v2_hello: bool,
    /// Split CBC application writes 1/n-1 on SSLv3 and TLS 1.0.
    pub cbc_record_splitting: bool,
    /// Accept records carrying up to 2^15 bytes of plaintext.
    pub accept_large_records: bool,
    /// Diagnostic categories.
    pub debug: DebugFlags,
    /// Prefix for diagnostic output, usually a connection name.
    pub label: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            min_version: ProtocolVersion::MIN,
            max_version: ProtocolVersion::MAX,
            max_fragment_size: MAX_DATA_SIZE,
            enable_v2_hello: false,
            cbc_record_splitting: true,
            accept_large_records: false,
            debug: DebugFlags::none(),
            label: String::new(),
        }
    }
}

impl RecordConfig {
    pub fn builder() -> RecordConfigBuilder {
        RecordConfigBuilder::default()
    }

    pub fn debug_sink(&self) -> DebugSink {
        DebugSink::new(self.debug, self.label.as_str())
    }

    /// Largest inbound packet, header included.
    pub fn max_packet_size(&self) -> usize {
        if self.accept_large_records {
            MAX_LARGE_RECORD_SIZE
        } else {
            MAX_RECORD_SIZE
        }
    }

    /// Largest inbound plaintext fragment.
    pub fn max_plaintext_size(&self) -> usize {
        if self.accept_large_records {
            2 * MAX_DATA_SIZE
        } else {
            MAX_DATA_SIZE
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordConfigBuilder {
    config: RecordConfig,
}

impl RecordConfigBuilder {
    pub fn min_version(mut self, version: ProtocolVersion) -> Self {
        self.config.min_version = version;
        self
    }

    pub fn max_version(mut self, version: ProtocolVersion) -> Self {
        self.config.max_version = version;
        self
    }

    pub fn max_fragment_size(mut self, size: usize) -> Self {
        self.config.max_fragment_size = size;
        self
    }

    pub fn enable_v2_hello(mut self, enabled: bool) -> Self {
        self.config.enable_v2_hello = enabled;
        self
    }

    pub fn cbc_record_splitting(mut self, enabled: bool) -> Self {
        self.config.cbc_record_splitting = enabled;
        self
    }

    pub fn accept_large_records(mut self, enabled: bool) -> Self {
        self.config.accept_large_records = enabled;
        self
    }

    pub fn debug(mut self, flags: DebugFlags) -> Self {
        self.config.debug = flags;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.config.label = label.to_string();
        self
    }

    pub fn build(self) -> Result<RecordConfig, TlsError> {
        let c = &self.config;
        if c.min_version > c.max_version {
            return Err(TlsError::Internal(format!(
                "min version {} above max version {}",
                c.min_version, c.max_version
            )));
        }
        if c.min_version < ProtocolVersion::MIN || c.max_version > ProtocolVersion::MAX {
            return Err(TlsError::Internal(format!(
                "version range {}..{} outside supported range",
                c.min_version, c.max_version
            )));
        }
        if c.max_fragment_size == 0 || c.max_fragment_size > MAX_DATA_SIZE {
            return Err(TlsError::Internal(format!(
                "max fragment size {} outside 1..={MAX_DATA_SIZE}",
                c.max_fragment_size
            )));
        }
        Ok(self.config)
    }
}
