//! Buffer-oriented writer for application data.
//!
//! Plaintext is gathered straight from the application buffers into the
//! network buffer, behind room left for the header and explicit nonce,
//! and sealed there.

use tlsrec_types::{ProtocolVersion, TlsError};

use super::args::EngineArgs;
use crate::debug::DebugSink;
use crate::record::limits::{HEADER_SIZE, MAX_DATA_SIZE_MINUS_ONE_BYTE_RECORD};
use crate::record::output::need_to_split_payload;
use crate::record::{protect, ContentType, Epoch};

#[derive(Debug)]
pub struct EngineOutputRecord {
    version: ProtocolVersion,
    max_fragment: usize,
    cbc_record_splitting: bool,
    first_app_record: bool,
    debug: DebugSink,
}

impl EngineOutputRecord {
    pub fn new(
        version: ProtocolVersion,
        max_fragment: usize,
        cbc_record_splitting: bool,
        debug: DebugSink,
    ) -> Self {
        Self {
            version,
            max_fragment,
            cbc_record_splitting,
            first_app_record: true,
            debug,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    /// A new write epoch starts; its first application record is never split.
    pub fn reset_epoch(&mut self) {
        self.first_app_record = true;
    }

    /// Plaintext sizes of the records the next write of `app_remaining`
    /// bytes produces.
    fn plan(&self, app_remaining: usize, epoch: &Epoch) -> (Option<usize>, usize) {
        if app_remaining == 0 {
            return (None, 0);
        }
        if need_to_split_payload(&epoch.cipher, self.first_app_record, self.cbc_record_splitting) {
            let rest = (app_remaining - 1)
                .min(MAX_DATA_SIZE_MINUS_ONE_BYTE_RECORD)
                .min(self.max_fragment);
            (Some(1), rest)
        } else {
            (None, app_remaining.min(self.max_fragment))
        }
    }

    /// Network space the next write of `app_remaining` bytes needs.
    pub fn required_space(&self, app_remaining: usize, epoch: &Epoch) -> usize {
        let (split, rest) = self.plan(app_remaining, epoch);
        let mut need = split.map_or(0, |n| epoch.sealed_len(n));
        if rest > 0 {
            need += epoch.sealed_len(rest);
        }
        need
    }

    /// Seal the pending application data into the network buffer. A
    /// zero-length write produces nothing. Returns the bytes produced.
    pub fn write(&mut self, args: &mut EngineArgs<'_>, epoch: &mut Epoch) -> Result<usize, TlsError> {
        let (split, rest) = self.plan(args.app_remaining(), epoch);
        if split.is_none() && rest == 0 {
            return Ok(0);
        }
        self.first_app_record = false;
        let mut produced = 0;
        if let Some(n) = split {
            produced += self.write_one(args, epoch, n)?;
        }
        if rest > 0 {
            produced += self.write_one(args, epoch, rest)?;
        }
        Ok(produced)
    }

    fn write_one(&mut self, args: &mut EngineArgs<'_>, epoch: &mut Epoch, len: usize) -> Result<usize, TlsError> {
        let need = epoch.sealed_len(len);
        if args.net.remaining() < need {
            return Err(TlsError::Internal(format!(
                "record of {need} bytes does not fit in {} bytes",
                args.net.remaining()
            )));
        }
        let start = args.net.position();
        let body = start + HEADER_SIZE + epoch.cipher.explicit_nonce_size();
        args.net.set_position(body)?;
        let gathered = args.gather(len)?;
        if gathered != len {
            return Err(TlsError::Internal(format!("gathered {gathered} of {len} bytes")));
        }
        let record = &mut args.net.storage_mut()?[start..start + need];
        self.debug
            .plaintext("Plaintext before ENCRYPTION", &record[body - start..body - start + len]);
        let total = protect::seal(epoch, ContentType::ApplicationData, self.version, record, len)?;
        args.net.set_position(start + total)?;
        self.debug.record(format_args!(
            "WRITE: {} ApplicationData, length = {len}",
            self.version
        ));
        self.debug
            .packet("Raw write", &args.net.storage()[start..start + total]);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordConfig;
    use crate::engine::buffer::Buffer;
    use crate::record::framing::{Decoded, Framing};
    use crate::record::EpochKeys;
    use tlsrec_crypto::Direction;
    use tlsrec_types::{CipherAlgId, MacAlgId};

    fn cbc_pair(version: ProtocolVersion) -> (Epoch, Epoch) {
        let keys = EpochKeys {
            version,
            cipher: CipherAlgId::Aes128Cbc,
            mac: MacAlgId::Sha1,
            key: &[1u8; 16],
            iv: &[2u8; 16],
            mac_key: &[3u8; 20],
        };
        (
            Epoch::from_keys(&keys, Direction::Encrypt).unwrap(),
            Epoch::from_keys(&keys, Direction::Decrypt).unwrap(),
        )
    }

    /// Open every record in `bytes` and return the plaintexts.
    fn open_all(bytes: &[u8], epoch: &mut Epoch) -> Vec<Vec<u8>> {
        let mut framing = Framing::new(&RecordConfig::default());
        framing.bytes_in_complete_packet(&[22, 3, 1, 0, 1]).unwrap();
        let mut out = Vec::new();
        let mut rest = bytes.to_vec();
        while !rest.is_empty() {
            let n = framing.bytes_in_complete_packet(&rest).unwrap().unwrap();
            let mut packet: Vec<u8> = rest.drain(..n).collect();
            match framing.decode(&mut packet, epoch).unwrap() {
                Decoded::Record { range, .. } => out.push(packet[range].to_vec()),
                other => panic!("unexpected {other:?}"),
            }
        }
        out
    }

    fn wrap_once(out: &mut EngineOutputRecord, epoch: &mut Epoch, data: &[u8]) -> (usize, Vec<u8>) {
        let mut apps = vec![Buffer::wrap(data.to_vec())];
        let mut net = Buffer::allocate(out.required_space(data.len(), epoch));
        let mut args = EngineArgs::for_wrap(&mut apps, 0, 1, &mut net).unwrap();
        let produced = out.write(&mut args, epoch).unwrap();
        let consumed = args.delta_app();
        assert_eq!(produced, args.delta_net());
        drop(args);
        net.flip();
        (consumed, net.as_slice().to_vec())
    }

    #[test]
    fn test_first_record_of_epoch_not_split() {
        let (mut w, mut r) = cbc_pair(ProtocolVersion::TLS10);
        let mut out = EngineOutputRecord::new(ProtocolVersion::TLS10, 16384, true, DebugSink::disabled());

        let (consumed, bytes) = wrap_once(&mut out, &mut w, b"first write");
        assert_eq!(consumed, 11);
        assert_eq!(open_all(&bytes, &mut r), vec![b"first write".to_vec()]);

        let (consumed, bytes) = wrap_once(&mut out, &mut w, b"second write");
        assert_eq!(consumed, 12);
        assert_eq!(
            open_all(&bytes, &mut r),
            vec![b"s".to_vec(), b"econd write".to_vec()]
        );

        out.reset_epoch();
        let (_, bytes) = wrap_once(&mut out, &mut w, b"third");
        assert_eq!(open_all(&bytes, &mut r).len(), 1);
    }

    #[test]
    fn test_no_split_when_disabled_or_tls11() {
        let (mut w, mut r) = cbc_pair(ProtocolVersion::TLS10);
        let mut out = EngineOutputRecord::new(ProtocolVersion::TLS10, 16384, false, DebugSink::disabled());
        let (_, b1) = wrap_once(&mut out, &mut w, b"one");
        let (_, b2) = wrap_once(&mut out, &mut w, b"two");
        assert_eq!(open_all(&b1, &mut r), vec![b"one".to_vec()]);
        assert_eq!(open_all(&b2, &mut r), vec![b"two".to_vec()]);

        let (mut w11, mut r11) = cbc_pair(ProtocolVersion::TLS11);
        let mut out11 = EngineOutputRecord::new(ProtocolVersion::TLS11, 16384, true, DebugSink::disabled());
        let (_, b1) = wrap_once(&mut out11, &mut w11, b"one");
        let (_, b2) = wrap_once(&mut out11, &mut w11, b"two");
        assert_eq!(open_all(&b1, &mut r11), vec![b"one".to_vec()]);
        assert_eq!(open_all(&b2, &mut r11), vec![b"two".to_vec()]);
    }

    #[test]
    fn test_fragment_limit_and_required_space() {
        let mut epoch = Epoch::null(ProtocolVersion::TLS12);
        let out = EngineOutputRecord::new(ProtocolVersion::TLS12, 1000, true, DebugSink::disabled());
        assert_eq!(out.required_space(5000, &epoch), 1005);
        assert_eq!(out.required_space(0, &epoch), 0);

        let mut out = out;
        let data = vec![9u8; 2500];
        let (consumed, bytes) = wrap_once(&mut out, &mut epoch, &data);
        assert_eq!(consumed, 1000);
        assert_eq!(bytes.len(), 1005);
        assert_eq!(&bytes[..5], &[23, 3, 3, 0x03, 0xE8]);
    }

    #[test]
    fn test_zero_length_write_is_noop() {
        let mut epoch = Epoch::null(ProtocolVersion::TLS12);
        let mut out = EngineOutputRecord::new(ProtocolVersion::TLS12, 16384, true, DebugSink::disabled());
        let (consumed, bytes) = wrap_once(&mut out, &mut epoch, &[]);
        assert_eq!(consumed, 0);
        assert!(bytes.is_empty());
        assert_eq!(epoch.auth.sequence_number(), 0);
    }
}
