//! Buffer-oriented record reader.
//!
//! Application records are opened in place in the caller's network buffer
//! and handed back as a range of its storage. Everything else is copied
//! into an internal accumulator first.

use std::ops::Range;

use tlsrec_types::TlsError;

use super::buffer::Buffer;
use crate::config::RecordConfig;
use crate::debug::DebugSink;
use crate::record::framing::{Decoded, Framing, RecordCodec};
use crate::record::{ContentType, Epoch, InboundRecord};

/// A record read from the network buffer.
#[derive(Debug)]
pub enum EngineInbound {
    /// Application plaintext at this range of the network buffer's storage.
    AppData(Range<usize>),
    Record(InboundRecord),
}

#[derive(Debug)]
pub struct EngineInputRecord {
    framing: Framing,
    internal: Vec<u8>,
    debug: DebugSink,
}

impl RecordCodec for EngineInputRecord {
    fn framing(&self) -> &Framing {
        &self.framing
    }

    fn framing_mut(&mut self) -> &mut Framing {
        &mut self.framing
    }
}

impl EngineInputRecord {
    pub fn new(config: &RecordConfig, debug: DebugSink) -> Self {
        Self {
            framing: Framing::new(config),
            internal: Vec::new(),
            debug,
        }
    }

    /// Size of the packet at the network buffer's position, if its header
    /// is complete.
    pub fn packet_len(&mut self, net: &Buffer) -> Result<Option<usize>, TlsError> {
        self.framing.bytes_in_complete_packet(net.as_slice())
    }

    /// Read the complete `packet_len`-byte packet at `net`'s position and
    /// advance past it.
    ///
    /// The in-place path narrows `net`'s limit to the packet; the caller
    /// restores it.
    pub fn read(
        &mut self,
        net: &mut Buffer,
        packet_len: usize,
        epoch: &mut Epoch,
    ) -> Result<EngineInbound, TlsError> {
        let start = net.position();
        let window = net.as_slice();
        if window.len() < packet_len {
            return Err(TlsError::Internal("incomplete packet passed to reader".into()));
        }
        self.debug.packet("Raw read", &window[..packet_len]);

        let in_place = self.framing.is_format_verified()
            && window[0] == ContentType::ApplicationData as u8
            && !net.is_read_only();
        if in_place {
            let end = start + packet_len;
            net.set_limit(end)?;
            let decoded = {
                let packet = &mut net.storage_mut()?[start..end];
                self.framing.decode(packet, epoch)?
            };
            net.set_position(end)?;
            return match decoded {
                Decoded::Record { range, .. } => {
                    let range = start + range.start..start + range.end;
                    self.debug
                        .plaintext("Plaintext after DECRYPTION", &net.storage()[range.clone()]);
                    Ok(EngineInbound::AppData(range))
                }
                Decoded::Converted(_) => Err(TlsError::Internal("unexpected SSLv2 record".into())),
            };
        }

        self.internal.clear();
        self.internal.extend_from_slice(&window[..packet_len]);
        net.set_position(start + packet_len)?;
        let record = match self.framing.decode(&mut self.internal, epoch)? {
            Decoded::Record {
                content_type,
                version,
                range,
            } => InboundRecord {
                content_type,
                version,
                payload: self.internal[range].to_vec(),
                legacy_v2_hello: None,
            },
            Decoded::Converted(record) => record,
        };
        self.debug.plaintext("Plaintext after DECRYPTION", &record.payload);
        Ok(EngineInbound::Record(record))
    }
}
