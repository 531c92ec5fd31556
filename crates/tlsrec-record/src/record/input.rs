//! Blocking record reader over `std::io::Read`.

use std::io::{ErrorKind, Read};

use tlsrec_types::TlsError;

use super::framing::{Decoded, Framing, RecordCodec};
use super::limits::HEADER_SIZE;
use super::{Epoch, InboundRecord};
use crate::config::RecordConfig;
use crate::debug::DebugSink;

/// Reads exactly one record at a time; never consumes bytes of the next.
#[derive(Debug)]
pub struct InputRecord {
    framing: Framing,
    buf: Vec<u8>,
    debug: DebugSink,
}

impl RecordCodec for InputRecord {
    fn framing(&self) -> &Framing {
        &self.framing
    }

    fn framing_mut(&mut self) -> &mut Framing {
        &mut self.framing
    }
}

impl InputRecord {
    pub fn new(config: &RecordConfig, debug: DebugSink) -> Self {
        Self {
            framing: Framing::new(config),
            buf: Vec::with_capacity(HEADER_SIZE),
            debug,
        }
    }

    /// Read the next packet into the internal buffer and return its size.
    ///
    /// `Ok(None)` on end of stream at a record boundary; end of stream
    /// inside a record is an error.
    pub fn read_packet<R: Read>(&mut self, reader: &mut R) -> Result<Option<usize>, TlsError> {
        self.buf.clear();
        match fill(reader, &mut self.buf, HEADER_SIZE)? {
            0 => return Ok(None),
            n if n < HEADER_SIZE => {
                return Err(TlsError::RecordError("end of stream inside record header".into()))
            }
            _ => {}
        }
        let total = self
            .framing
            .bytes_in_complete_packet(&self.buf)?
            .ok_or_else(|| TlsError::Internal("record header not framed".into()))?;
        if fill(reader, &mut self.buf, total)? < total {
            return Err(TlsError::RecordError("end of stream inside record".into()));
        }
        self.debug.packet("Raw read", &self.buf[..total]);
        Ok(Some(total))
    }

    /// Read, decrypt and verify the next record.
    pub fn read<R: Read>(
        &mut self,
        reader: &mut R,
        epoch: &mut Epoch,
    ) -> Result<Option<InboundRecord>, TlsError> {
        let total = match self.read_packet(reader)? {
            Some(n) => n,
            None => return Ok(None),
        };
        let record = match self.framing.decode(&mut self.buf[..total], epoch)? {
            Decoded::Record {
                content_type,
                version,
                range,
            } => InboundRecord {
                content_type,
                version,
                payload: self.buf[range].to_vec(),
                legacy_v2_hello: None,
            },
            Decoded::Converted(record) => {
                self.debug.handshake(format_args!("converted SSLv2 ClientHello"));
                record
            }
        };
        self.debug.plaintext("Plaintext after DECRYPTION", &record.payload);
        Ok(Some(record))
    }
}

/// Grow `buf` to `want` bytes from `reader`; returns the length reached,
/// short only at end of stream.
fn fill<R: Read>(reader: &mut R, buf: &mut Vec<u8>, want: usize) -> Result<usize, TlsError> {
    let mut have = buf.len();
    buf.resize(want.max(have), 0);
    while have < want {
        match reader.read(&mut buf[have..want]) {
            Ok(0) => break,
            Ok(n) => have += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                buf.truncate(have);
                return Err(e.into());
            }
        }
    }
    buf.truncate(have);
    Ok(have)
}
