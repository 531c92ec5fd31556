//! Inbound packet framing shared by the stream and engine readers.
//!
//! Until the first genuine SSLv3/TLS header is seen, an inbound packet may
//! also be a legacy SSLv2 record. [`Framing`] carries the latch that stops
//! consulting the legacy heuristic once a real header has been accepted.

use std::ops::Range;

use tlsrec_types::{ProtocolVersion, TlsError};

use super::limits::{HEADER_SIZE, V2_LONG_HEADER_SIZE, V2_SHORT_HEADER_SIZE};
use super::{protect, v2hello, ContentType, Epoch, InboundRecord, RecordHeader};
use crate::config::RecordConfig;

/// SSLv2 message types that can open a connection.
const V2_CLIENT_HELLO: u8 = 1;
const V2_SERVER_HELLO: u8 = 4;

/// Outcome of decoding one complete packet.
#[derive(Debug)]
pub enum Decoded {
    /// A verified record whose plaintext lies at `range` within the packet.
    Record {
        content_type: ContentType,
        version: ProtocolVersion,
        range: Range<usize>,
    },
    /// An SSLv2 ClientHello converted to a handshake record.
    Converted(InboundRecord),
}

#[derive(Debug, Clone)]
pub struct Framing {
    format_verified: bool,
    min_version: ProtocolVersion,
    max_version: ProtocolVersion,
    enable_v2_hello: bool,
    max_packet: usize,
    max_plaintext: usize,
}

impl Framing {
    pub fn new(config: &RecordConfig) -> Self {
        Self {
            format_verified: false,
            min_version: config.min_version,
            max_version: config.max_version,
            enable_v2_hello: config.enable_v2_hello,
            max_packet: config.max_packet_size(),
            max_plaintext: config.max_plaintext_size(),
        }
    }

    /// A standard record header has been accepted.
    pub fn is_format_verified(&self) -> bool {
        self.format_verified
    }

    /// Reject versions below the configured minimum (SSLv2Hello excepted
    /// when `allow_v2_hello`) and major versions above the maximum.
    pub fn check_record_version(
        &self,
        version: ProtocolVersion,
        allow_v2_hello: bool,
    ) -> Result<(), TlsError> {
        let v2_hello = allow_v2_hello && version == ProtocolVersion::SSL20_HELLO;
        if (version < self.min_version && !v2_hello) || version.major > self.max_version.major {
            return Err(TlsError::UnsupportedRecordVersion {
                major: version.major,
                minor: version.minor,
            });
        }
        Ok(())
    }

    /// Size of the packet starting at `data[0]`, header included.
    ///
    /// `None` until five bytes are available. Validates the header and sets
    /// the latch for standard records.
    pub fn bytes_in_complete_packet(&mut self, data: &[u8]) -> Result<Option<usize>, TlsError> {
        if data.len() < HEADER_SIZE {
            return Ok(None);
        }
        let b0 = data[0];
        if self.format_verified
            || b0 == ContentType::Handshake as u8
            || b0 == ContentType::Alert as u8
        {
            let version = ProtocolVersion::new(data[1], data[2]);
            self.check_record_version(version, false)?;
            self.format_verified = true;
            let len = HEADER_SIZE + u16::from_be_bytes([data[3], data[4]]) as usize;
            if len > self.max_packet {
                return Err(TlsError::RecordOverflow(format!(
                    "input record of {len} bytes exceeds {}",
                    self.max_packet
                )));
            }
            return Ok(Some(len));
        }

        let len = if b0 & 0x80 != 0 {
            let msg_type = data[2];
            if msg_type != V2_CLIENT_HELLO && msg_type != V2_SERVER_HELLO {
                return Err(TlsError::UnrecognizedMessage);
            }
            if msg_type == V2_CLIENT_HELLO {
                self.check_record_version(ProtocolVersion::new(data[3], data[4]), true)?;
            }
            ((((b0 & 0x7F) as usize) << 8) | data[1] as usize) + V2_SHORT_HEADER_SIZE
        } else {
            let msg_type = data[3];
            if msg_type != V2_CLIENT_HELLO && msg_type != V2_SERVER_HELLO {
                return Err(TlsError::UnrecognizedMessage);
            }
            ((((b0 & 0x3F) as usize) << 8) | data[1] as usize) + V2_LONG_HEADER_SIZE
        };
        if len < HEADER_SIZE {
            return Err(TlsError::RecordError(format!("SSLv2 record of {len} bytes")));
        }
        Ok(Some(len))
    }

    /// Decode one complete `packet` (as sized by
    /// [`bytes_in_complete_packet`](Self::bytes_in_complete_packet)),
    /// opening standard records in place with `epoch`.
    pub fn decode(&self, packet: &mut [u8], epoch: &mut Epoch) -> Result<Decoded, TlsError> {
        if !self.format_verified {
            return self.decode_legacy(packet).map(Decoded::Converted);
        }
        let header = RecordHeader::decode(packet)?;
        if HEADER_SIZE + header.length != packet.len() {
            return Err(TlsError::Internal(format!(
                "packet of {} bytes for a {}-byte record",
                packet.len(),
                header.length
            )));
        }
        if header.length == 0 && header.content_type != ContentType::ApplicationData {
            return Err(TlsError::RecordError(format!(
                "empty {:?} record",
                header.content_type
            )));
        }
        let range = protect::open(epoch, header.content_type, &mut packet[HEADER_SIZE..])?;
        if range.len() > self.max_plaintext {
            return Err(TlsError::RecordOverflow(format!(
                "{} bytes of plaintext exceeds {}",
                range.len(),
                self.max_plaintext
            )));
        }
        Ok(Decoded::Record {
            content_type: header.content_type,
            version: header.version,
            range: HEADER_SIZE + range.start..HEADER_SIZE + range.end,
        })
    }

    fn decode_legacy(&self, packet: &[u8]) -> Result<InboundRecord, TlsError> {
        if packet[0] & 0x80 == 0 || packet[2] == V2_SERVER_HELLO {
            return Err(TlsError::HandshakeFailed(
                "SSL V2.0 servers are not supported".into(),
            ));
        }
        if !self.enable_v2_hello {
            return Err(TlsError::HandshakeFailed(
                "SSLv2 format ClientHello is disabled".into(),
            ));
        }
        if ProtocolVersion::new(packet[3], packet[4]) == ProtocolVersion::SSL20_HELLO {
            return Err(TlsError::HandshakeFailed(
                "SSL V2.0 ClientHello is not supported".into(),
            ));
        }
        v2hello::convert_client_hello(&packet[V2_SHORT_HEADER_SIZE..])
    }
}

/// Inbound record decoding shared by [`InputRecord`](super::input::InputRecord)
/// and the engine's input record.
pub trait RecordCodec {
    fn framing(&self) -> &Framing;

    fn framing_mut(&mut self) -> &mut Framing;

    fn is_format_verified(&self) -> bool {
        self.framing().is_format_verified()
    }

    fn bytes_in_complete_packet(&mut self, data: &[u8]) -> Result<Option<usize>, TlsError> {
        self.framing_mut().bytes_in_complete_packet(data)
    }
}
