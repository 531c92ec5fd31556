//! Blocking record writer over `std::io::Write`.

use std::io::Write;

use tlsrec_types::{ProtocolVersion, TlsError};

use super::cipher_box::CipherBox;
use super::limits::MAX_DATA_SIZE;
use super::{protect, ContentType, Epoch};
use crate::debug::DebugSink;

/// Whether the next application write should go out as a one-byte record
/// followed by the rest (CBC on SSLv3 / TLS 1.0).
pub(crate) fn need_to_split_payload(cipher: &CipherBox, first_app_record: bool, enabled: bool) -> bool {
    enabled && cipher.is_cbc_mode() && cipher.version() <= ProtocolVersion::TLS10 && !first_app_record
}

#[derive(Debug)]
pub struct OutputRecord {
    version: ProtocolVersion,
    held: Vec<u8>,
    debug: DebugSink,
}

impl OutputRecord {
    pub fn new(version: ProtocolVersion, debug: DebugSink) -> Self {
        Self {
            version,
            held: Vec::new(),
            debug,
        }
    }

    /// Version stamped on outbound record headers.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    /// Records sealed but not yet written.
    pub fn has_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Seal `payload` as one record and write it, or keep it back when
    /// `hold` is set so it goes out with the next unheld write.
    ///
    /// An empty payload produces no record, but still releases held
    /// records when `hold` is clear.
    pub fn write<W: Write>(
        &mut self,
        writer: &mut W,
        content_type: ContentType,
        payload: &[u8],
        epoch: &mut Epoch,
        hold: bool,
    ) -> Result<(), TlsError> {
        if payload.len() > MAX_DATA_SIZE {
            return Err(TlsError::RecordOverflow(format!(
                "{} bytes of plaintext in one record",
                payload.len()
            )));
        }
        if payload.is_empty() {
            return if hold { Ok(()) } else { self.flush(writer) };
        }
        self.debug.plaintext("Plaintext before ENCRYPTION", payload);
        let record = protect::seal_to_vec(epoch, content_type, self.version, payload)?;
        self.debug.record(format_args!(
            "WRITE: {} {content_type:?}, length = {}",
            self.version,
            payload.len()
        ));
        self.held.extend_from_slice(&record);
        if hold {
            return Ok(());
        }
        self.flush(writer)
    }

    /// Write any held records.
    pub fn flush<W: Write>(&mut self, writer: &mut W) -> Result<(), TlsError> {
        if self.held.is_empty() {
            return Ok(());
        }
        self.debug.packet("Raw write", &self.held);
        writer.write_all(&self.held)?;
        writer.flush()?;
        self.held.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EpochKeys;
    use tlsrec_crypto::Direction;
    use tlsrec_types::{CipherAlgId, MacAlgId};

    fn output() -> OutputRecord {
        OutputRecord::new(ProtocolVersion::TLS10, DebugSink::disabled())
    }

    #[test]
    fn test_write_null_record() {
        let mut out = Vec::new();
        let mut epoch = Epoch::null(ProtocolVersion::TLS10);
        output()
            .write(&mut out, ContentType::Handshake, &[1, 2, 3], &mut epoch, false)
            .unwrap();
        assert_eq!(out, vec![22, 3, 1, 0, 3, 1, 2, 3]);
        assert_eq!(epoch.auth.sequence_number(), 1);
    }

    #[test]
    fn test_empty_record_skipped() {
        let mut out = Vec::new();
        let mut epoch = Epoch::null(ProtocolVersion::TLS10);
        output()
            .write(&mut out, ContentType::ApplicationData, &[], &mut epoch, false)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(epoch.auth.sequence_number(), 0);
    }

    #[test]
    fn test_held_records_flushed_together() {
        let mut out = Vec::new();
        let mut epoch = Epoch::null(ProtocolVersion::TLS10);
        let mut rec = output();
        rec.write(&mut out, ContentType::Handshake, &[1], &mut epoch, true).unwrap();
        rec.write(&mut out, ContentType::Handshake, &[2], &mut epoch, true).unwrap();
        assert!(out.is_empty());
        assert!(rec.has_held());
        // An empty unheld write releases what was held.
        rec.write(&mut out, ContentType::ApplicationData, &[], &mut epoch, false).unwrap();
        assert_eq!(out, vec![22, 3, 1, 0, 1, 1, 22, 3, 1, 0, 1, 2]);
        assert!(!rec.has_held());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut out = Vec::new();
        let mut epoch = Epoch::null(ProtocolVersion::TLS10);
        let payload = vec![0u8; MAX_DATA_SIZE + 1];
        assert!(matches!(
            output().write(&mut out, ContentType::ApplicationData, &payload, &mut epoch, false),
            Err(TlsError::RecordOverflow(_))
        ));
    }

    #[test]
    fn test_need_to_split_payload() {
        let keys = |version| EpochKeys {
            version,
            cipher: CipherAlgId::Aes128Cbc,
            mac: MacAlgId::Sha1,
            key: &[1u8; 16],
            iv: &[2u8; 16],
            mac_key: &[3u8; 20],
        };
        let tls10 = Epoch::from_keys(&keys(ProtocolVersion::TLS10), Direction::Encrypt).unwrap();
        let tls11 = Epoch::from_keys(&keys(ProtocolVersion::TLS11), Direction::Encrypt).unwrap();
        assert!(need_to_split_payload(&tls10.cipher, false, true));
        assert!(!need_to_split_payload(&tls10.cipher, true, true));
        assert!(!need_to_split_payload(&tls10.cipher, false, false));
        assert!(!need_to_split_payload(&tls11.cipher, false, true));
        let null = Epoch::null(ProtocolVersion::TLS10);
        assert!(!need_to_split_payload(&null.cipher, false, true));
    }
}
