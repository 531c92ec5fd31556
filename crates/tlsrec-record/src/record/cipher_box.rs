//! Bulk cipher bound to one direction of one epoch.
//!
//! Applies CBC padding, TLS 1.1+ explicit IVs and TLS 1.2 AEAD nonces on
//! top of the primitives from `tlsrec-crypto`.

use tlsrec_crypto::{Aead, BlockMode, Direction, StreamMode};
use tlsrec_types::{CipherAlgId, CipherType, CryptoError, ProtocolVersion, TlsError};
use zeroize::Zeroize;

use super::authenticator::{AuthBytes, Authenticator};
use super::ContentType;

const AEAD_NONCE_LEN: usize = 12;

/// Number of trailer positions examined by every padding check.
const PADDING_SCAN_ITERATIONS: usize = 257;

struct PendingAead {
    nonce: [u8; AEAD_NONCE_LEN],
    aad: AuthBytes,
}

/// AEAD state: the keyed cipher, its implicit IV and the nonce prepared
/// for the next record.
pub struct AeadCipher {
    aead: Box<dyn Aead>,
    fixed_iv: Vec<u8>,
    record_iv_len: usize,
    pending: Option<PendingAead>,
}

impl Drop for AeadCipher {
    fn drop(&mut self) {
        self.fixed_iv.zeroize();
    }
}

impl AeadCipher {
    fn nonce_for(&self, sequence: [u8; 8], explicit: &[u8]) -> [u8; AEAD_NONCE_LEN] {
        let mut nonce = [0u8; AEAD_NONCE_LEN];
        if self.record_iv_len == 0 {
            // RFC 7905: fixed IV xor left-padded sequence number.
            nonce.copy_from_slice(&self.fixed_iv[..AEAD_NONCE_LEN]);
            for (n, s) in nonce[4..].iter_mut().zip(sequence.iter()) {
                *n ^= s;
            }
        } else {
            let salt = self.fixed_iv.len();
            nonce[..salt].copy_from_slice(&self.fixed_iv);
            nonce[salt..].copy_from_slice(explicit);
        }
        nonce
    }
}

/// The bulk cipher of an epoch.
pub enum BulkCipher {
    Identity,
    Stream(Box<dyn StreamMode>),
    BlockCbc(Box<dyn BlockMode>),
    Aead(Box<AeadCipher>),
}

pub struct CipherBox {
    direction: Direction,
    version: ProtocolVersion,
    alg: CipherAlgId,
    block_size: usize,
    cipher: BulkCipher,
    disposed: bool,
}

impl std::fmt::Debug for CipherBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherBox")
            .field("direction", &self.direction)
            .field("version", &self.version)
            .field("alg", &self.alg)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl CipherBox {
    /// The identity transform.
    pub fn null(version: ProtocolVersion) -> Self {
        Self {
            direction: Direction::Encrypt,
            version,
            alg: CipherAlgId::Null,
            block_size: 0,
            cipher: BulkCipher::Identity,
            disposed: false,
        }
    }

    pub fn new(
        version: ProtocolVersion,
        alg: CipherAlgId,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self, TlsError> {
        let cipher = match alg.cipher_type() {
            CipherType::Null => BulkCipher::Identity,
            CipherType::Stream => BulkCipher::Stream(tlsrec_crypto::new_stream_mode(alg, key)?),
            CipherType::Block => {
                BulkCipher::BlockCbc(tlsrec_crypto::new_block_mode(alg, direction, key, iv)?)
            }
            CipherType::Aead => {
                if version < ProtocolVersion::TLS12 {
                    return Err(TlsError::RecordError(format!(
                        "AEAD cipher not usable with {version}"
                    )));
                }
                if iv.len() != alg.fixed_iv_len() {
                    return Err(CryptoError::InvalidIvLength.into());
                }
                BulkCipher::Aead(Box::new(AeadCipher {
                    aead: tlsrec_crypto::new_aead(alg, key)?,
                    fixed_iv: iv.to_vec(),
                    record_iv_len: alg.record_iv_len(),
                    pending: None,
                }))
            }
        };
        Ok(Self {
            direction,
            version,
            alg,
            block_size: alg.block_size(),
            cipher,
            disposed: false,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cipher_alg(&self) -> CipherAlgId {
        self.alg
    }

    pub fn is_null_cipher(&self) -> bool {
        matches!(self.cipher, BulkCipher::Identity)
    }

    pub fn is_cbc_mode(&self) -> bool {
        matches!(self.cipher, BulkCipher::BlockCbc(_))
    }

    pub fn is_aead_mode(&self) -> bool {
        matches!(self.cipher, BulkCipher::Aead(_))
    }

    /// 0 for stream, AEAD and null ciphers.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// AEAD tag length; 0 otherwise.
    pub fn tag_size(&self) -> usize {
        match &self.cipher {
            BulkCipher::Aead(a) => a.aead.tag_size(),
            _ => 0,
        }
    }

    /// Bytes of explicit IV or nonce carried at the start of each fragment.
    pub fn explicit_nonce_size(&self) -> usize {
        match &self.cipher {
            BulkCipher::BlockCbc(_) if self.version.uses_explicit_iv() => self.block_size,
            BulkCipher::Aead(a) => a.record_iv_len,
            _ => 0,
        }
    }

    /// Fragment length after sealing `payload_len` bytes with a `mac_len`
    /// byte MAC.
    pub fn sealed_fragment_len(&self, payload_len: usize, mac_len: usize) -> usize {
        let nonce = self.explicit_nonce_size();
        match &self.cipher {
            BulkCipher::BlockCbc(_) => {
                let bs = self.block_size;
                nonce + (payload_len + mac_len + 1).div_ceil(bs) * bs
            }
            BulkCipher::Aead(_) => nonce + payload_len + self.tag_size(),
            _ => payload_len + mac_len,
        }
    }

    /// Quick structural check of an inbound fragment before decryption.
    pub fn sanity_check(&self, tag_len: usize, fragment_len: usize) -> bool {
        if !self.is_cbc_mode() {
            return fragment_len >= tag_len;
        }
        let bs = self.block_size;
        if fragment_len % bs != 0 {
            return false;
        }
        let mut minimal = (tag_len + 1).max(bs);
        if self.version.uses_explicit_iv() {
            minimal += bs;
        }
        fragment_len >= minimal
    }

    /// Write the explicit nonce for an outbound record into `out` and
    /// return its size.
    ///
    /// For AEAD suites this acquires the additional data from `auth`,
    /// consuming the record's sequence number; `fragment_len` is the
    /// plaintext length.
    pub fn create_explicit_nonce(
        &mut self,
        auth: &mut Authenticator,
        content_type: ContentType,
        fragment_len: usize,
        out: &mut [u8],
    ) -> Result<usize, TlsError> {
        let size = self.explicit_nonce_size();
        if out.len() < size {
            return Err(TlsError::Internal("no room for explicit nonce".into()));
        }
        match &mut self.cipher {
            BulkCipher::BlockCbc(_) if size > 0 => {
                getrandom::getrandom(&mut out[..size])
                    .map_err(|e| TlsError::Internal(format!("RNG failed: {e}")))?;
            }
            BulkCipher::Aead(a) => {
                let aad = auth.acquire_authentication_bytes(content_type, fragment_len);
                let sequence = aad.sequence_bytes();
                out[..size].copy_from_slice(&sequence[..size]);
                let nonce = a.nonce_for(sequence, &sequence[..size]);
                a.pending = Some(PendingAead { nonce, aad });
            }
            _ => {}
        }
        Ok(size)
    }

    /// Read the explicit nonce at the start of an inbound `fragment` and
    /// return its size.
    ///
    /// For CBC suites this runs the sanity check. For AEAD suites it
    /// acquires the additional data from `auth`; a fragment too short to
    /// hold nonce and tag fails before the sequence number is consumed.
    pub fn apply_explicit_nonce(
        &mut self,
        auth: &mut Authenticator,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<usize, TlsError> {
        let tag_len = auth.tag_len();
        let size = self.explicit_nonce_size();
        if self.is_cbc_mode() {
            if tag_len != 0 && !self.sanity_check(tag_len, fragment.len()) {
                return Err(TlsError::BadRecordMac);
            }
            return Ok(size);
        }
        if let BulkCipher::Aead(a) = &mut self.cipher {
            let tag = a.aead.tag_size();
            if fragment.len() < size + tag {
                return Err(TlsError::BadRecordMac);
            }
            let aad = auth.acquire_authentication_bytes(content_type, fragment.len() - size - tag);
            let nonce = a.nonce_for(aad.sequence_bytes(), &fragment[..size]);
            a.pending = Some(PendingAead { nonce, aad });
            return Ok(size);
        }
        Ok(size)
    }

    /// Encrypt `buf[..len]` in place and return the new length.
    ///
    /// CBC pads up to a block multiple, AEAD appends its tag; `buf` must
    /// have room for either. For AEAD, `buf` starts after the explicit
    /// nonce and [`create_explicit_nonce`](Self::create_explicit_nonce)
    /// must have run first.
    pub fn encrypt(&mut self, buf: &mut [u8], len: usize) -> Result<usize, TlsError> {
        if self.disposed {
            return Err(TlsError::Internal("cipher already disposed".into()));
        }
        let bs = self.block_size;
        match &mut self.cipher {
            BulkCipher::Identity => Ok(len),
            BulkCipher::Stream(s) => {
                s.apply_keystream(&mut buf[..len]);
                Ok(len)
            }
            BulkCipher::BlockCbc(b) => {
                let new_len = add_padding(buf, len, bs)?;
                b.process_blocks(&mut buf[..new_len])
                    .map_err(|e| TlsError::Internal(format!("block cipher failed: {e}")))?;
                Ok(new_len)
            }
            BulkCipher::Aead(a) => {
                let pending = a
                    .pending
                    .take()
                    .ok_or_else(|| TlsError::Internal("AEAD nonce not initialized".into()))?;
                let tag = a.aead.tag_size();
                let out = a
                    .aead
                    .seal_in_place(&pending.nonce, &pending.aad, buf, len)
                    .map_err(|e| TlsError::Internal(format!("AEAD seal failed: {e}")))?;
                if out != len + tag {
                    return Err(TlsError::Internal("unexpected AEAD output length".into()));
                }
                Ok(out)
            }
        }
    }

    /// Decrypt `buf[..len]` in place and return the plaintext length.
    ///
    /// For CBC the result still includes the explicit IV block (TLS 1.1+)
    /// and the MAC, but not the padding. Padding and tag failures report
    /// [`TlsError::BadRecordMac`].
    pub fn decrypt(&mut self, buf: &mut [u8], len: usize, tag_len: usize) -> Result<usize, TlsError> {
        if self.disposed {
            return Err(TlsError::Internal("cipher already disposed".into()));
        }
        let bs = self.block_size;
        let version = self.version;
        match &mut self.cipher {
            BulkCipher::Identity => Ok(len),
            BulkCipher::Stream(s) => {
                s.apply_keystream(&mut buf[..len]);
                Ok(len)
            }
            BulkCipher::BlockCbc(b) => {
                if len == 0 || len % bs != 0 {
                    return Err(TlsError::BadRecordMac);
                }
                b.process_blocks(&mut buf[..len]).map_err(|e| match e {
                    CryptoError::NotBlockAligned => TlsError::BadRecordMac,
                    e => TlsError::Internal(format!("block cipher failed: {e}")),
                })?;
                let new_len = remove_padding(&buf[..len], tag_len, bs, version)?;
                if version.uses_explicit_iv() && new_len < bs {
                    return Err(TlsError::BadRecordMac);
                }
                Ok(new_len)
            }
            BulkCipher::Aead(a) => {
                let pending = a
                    .pending
                    .take()
                    .ok_or_else(|| TlsError::Internal("AEAD nonce not initialized".into()))?;
                let tag = a.aead.tag_size();
                let out = a
                    .aead
                    .open_in_place(&pending.nonce, &pending.aad, buf, len)
                    .map_err(|e| match e {
                        CryptoError::AeadTagVerifyFail | CryptoError::BufferTooSmall { .. } => {
                            TlsError::BadRecordMac
                        }
                        e => TlsError::Internal(format!("AEAD open failed: {e}")),
                    })?;
                if out + tag != len {
                    return Err(TlsError::Internal("unexpected AEAD output length".into()));
                }
                Ok(out)
            }
        }
    }

    /// Release the underlying cipher. Idempotent; failures are logged.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let result = match &mut self.cipher {
            BulkCipher::BlockCbc(b) => b.finalize(),
            BulkCipher::Stream(s) => s.finalize(),
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::warn!(target: "tlsrec::record", "cipher dispose failed: {e}");
        }
        self.cipher = BulkCipher::Identity;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for CipherBox {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Append TLS CBC padding to `buf[..len]` and return the padded length,
/// the smallest multiple of `block_size` greater than `len`.
pub(crate) fn add_padding(buf: &mut [u8], len: usize, block_size: usize) -> Result<usize, TlsError> {
    let new_len = (len + 1).div_ceil(block_size) * block_size;
    if buf.len() < new_len {
        return Err(TlsError::Internal("no space to pad buffer".into()));
    }
    let pad = new_len - len;
    buf[len..new_len].fill((pad - 1) as u8);
    Ok(new_len)
}

/// Count trailer bytes of `data` equal and unequal to `pad`, cycling over
/// `data` for a fixed number of iterations.
pub(crate) fn check_padding(data: &[u8], pad: u8) -> (usize, usize) {
    let mut missed = 0usize;
    let mut matched = 0usize;
    if data.is_empty() {
        return (missed, matched);
    }
    let mut i = 0;
    while i < PADDING_SCAN_ITERATIONS {
        for b in data {
            if i >= PADDING_SCAN_ITERATIONS {
                break;
            }
            let eq = usize::from(*b == pad);
            matched += eq;
            missed += 1 - eq;
            i += 1;
        }
    }
    (missed, matched)
}

/// Strip CBC padding from decrypted `data` and return the remaining length.
///
/// TLS requires every trailer byte to equal the pad length; SSLv3 only
/// bounds the pad length by the block size.
pub(crate) fn remove_padding(
    data: &[u8],
    tag_len: usize,
    block_size: usize,
    version: ProtocolVersion,
) -> Result<usize, TlsError> {
    let len = data.len();
    let pad_len = match data.last() {
        Some(b) => *b as usize,
        None => return Err(TlsError::BadRecordMac),
    };
    if len < pad_len + 1 + tag_len {
        // Same work as a real check before rejecting.
        let _ = check_padding(data, pad_len as u8);
        return Err(TlsError::BadRecordMac);
    }
    let new_len = len - (pad_len + 1);
    let (missed, _) = check_padding(&data[new_len..], pad_len as u8);
    if version.is_tls() {
        if missed != 0 {
            return Err(TlsError::BadRecordMac);
        }
    } else if pad_len > block_size {
        return Err(TlsError::BadRecordMac);
    }
    Ok(new_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlsrec_types::MacAlgId;

    fn cbc_pair(version: ProtocolVersion, alg: CipherAlgId) -> (CipherBox, CipherBox) {
        let key = vec![0x42u8; alg.key_len()];
        let iv = vec![0x24u8; alg.block_size()];
        (
            CipherBox::new(version, alg, Direction::Encrypt, &key, &iv).unwrap(),
            CipherBox::new(version, alg, Direction::Decrypt, &key, &iv).unwrap(),
        )
    }

    #[test]
    fn test_add_padding_13_of_16() {
        let mut buf = [0xEEu8; 32];
        let n = add_padding(&mut buf, 13, 16).unwrap();
        assert_eq!(n, 16);
        assert_eq!(&buf[13..16], &[2, 2, 2]);
    }

    #[test]
    fn test_add_padding_full_block() {
        let mut buf = [0u8; 32];
        let n = add_padding(&mut buf, 16, 16).unwrap();
        assert_eq!(n, 32);
        assert!(buf[16..32].iter().all(|&b| b == 15));

        let mut small = [0u8; 16];
        assert!(add_padding(&mut small, 16, 16).is_err());
    }

    #[test]
    fn test_check_padding_fixed_iterations() {
        for len in [1usize, 3, 16, 256] {
            let data = vec![7u8; len];
            let (missed, matched) = check_padding(&data, 7);
            assert_eq!(missed + matched, 257);
            assert_eq!(missed, 0);
        }
        let (missed, matched) = check_padding(&[1, 7, 7], 7);
        assert_eq!(missed + matched, 257);
        assert!(missed > 0);
    }

    #[test]
    fn test_remove_padding_tls_rejects_bad_trailer() {
        let mut data = vec![0u8; 32];
        data[29..32].copy_from_slice(&[2, 2, 2]);
        assert_eq!(remove_padding(&data, 20, 16, ProtocolVersion::TLS10).unwrap(), 29);

        data[29] = 9;
        assert!(matches!(
            remove_padding(&data, 20, 16, ProtocolVersion::TLS10),
            Err(TlsError::BadRecordMac)
        ));
    }

    #[test]
    fn test_remove_padding_ssl3_laxity() {
        let mut data = vec![0u8; 32];
        data[31] = 2;
        data[29] = 0xAB;
        assert_eq!(remove_padding(&data, 16, 16, ProtocolVersion::SSL30).unwrap(), 29);

        data[31] = 17;
        assert!(remove_padding(&data, 0, 16, ProtocolVersion::SSL30).is_err());
    }

    #[test]
    fn test_remove_padding_too_long_for_mac() {
        let mut data = vec![0u8; 32];
        data[31] = 20;
        assert!(matches!(
            remove_padding(&data, 20, 16, ProtocolVersion::TLS12),
            Err(TlsError::BadRecordMac)
        ));
    }

    #[test]
    fn test_sanity_check() {
        let (enc10, _) = cbc_pair(ProtocolVersion::TLS10, CipherAlgId::Aes128Cbc);
        assert!(enc10.sanity_check(20, 32));
        assert!(!enc10.sanity_check(20, 16));
        assert!(!enc10.sanity_check(20, 33));

        let (enc11, _) = cbc_pair(ProtocolVersion::TLS11, CipherAlgId::Aes128Cbc);
        assert!(!enc11.sanity_check(20, 32));
        assert!(enc11.sanity_check(20, 48));

        let null = CipherBox::null(ProtocolVersion::TLS10);
        assert!(null.sanity_check(20, 20));
        assert!(!null.sanity_check(20, 19));
    }

    #[test]
    fn test_cbc_encrypt_decrypt_with_padding() {
        let (mut enc, mut dec) = cbc_pair(ProtocolVersion::TLS10, CipherAlgId::DesEde3Cbc);
        let mut buf = vec![0u8; 64];
        buf[..21].copy_from_slice(b"twenty-one byte input");
        let n = enc.encrypt(&mut buf, 21).unwrap();
        assert_eq!(n, 24);
        let m = dec.decrypt(&mut buf, n, 0).unwrap();
        assert_eq!(m, 21);
        assert_eq!(&buf[..21], b"twenty-one byte input");
    }

    #[test]
    fn test_cbc_explicit_iv_roundtrip() {
        let (mut enc, mut dec) = cbc_pair(ProtocolVersion::TLS12, CipherAlgId::Aes256Cbc);
        let mut auth_w = Authenticator::null(ProtocolVersion::TLS12);
        let mut auth_r = Authenticator::null(ProtocolVersion::TLS12);
        let mut buf = vec![0u8; 96];
        let nonce = enc
            .create_explicit_nonce(&mut auth_w, ContentType::ApplicationData, 5, &mut buf)
            .unwrap();
        assert_eq!(nonce, 16);
        buf[16..21].copy_from_slice(b"hello");
        let n = enc.encrypt(&mut buf, 21).unwrap();
        assert_eq!(n, 32);

        let skip = dec
            .apply_explicit_nonce(&mut auth_r, ContentType::ApplicationData, &buf[..n])
            .unwrap();
        assert_eq!(skip, 16);
        let m = dec.decrypt(&mut buf, n, 0).unwrap();
        assert_eq!(&buf[skip..m], b"hello");
    }

    #[test]
    fn test_aead_nonce_and_roundtrip() {
        for alg in [CipherAlgId::Aes128Gcm, CipherAlgId::ChaCha20Poly1305] {
            let key = vec![9u8; alg.key_len()];
            let iv = vec![3u8; alg.fixed_iv_len()];
            let mut enc = CipherBox::new(ProtocolVersion::TLS12, alg, Direction::Encrypt, &key, &iv).unwrap();
            let mut dec = CipherBox::new(ProtocolVersion::TLS12, alg, Direction::Decrypt, &key, &iv).unwrap();
            let mut auth_w = Authenticator::null(ProtocolVersion::TLS12);
            let mut auth_r = Authenticator::null(ProtocolVersion::TLS12);

            let mut buf = vec![0u8; 64];
            let nonce = enc
                .create_explicit_nonce(&mut auth_w, ContentType::Handshake, 4, &mut buf)
                .unwrap();
            assert_eq!(nonce, alg.record_iv_len());
            buf[nonce..nonce + 4].copy_from_slice(b"abcd");
            let n = enc.encrypt(&mut buf[nonce..], 4).unwrap();
            assert_eq!(n, 4 + 16);
            assert_eq!(auth_w.sequence_number(), 1);

            let frag_len = nonce + n;
            let skip = dec
                .apply_explicit_nonce(&mut auth_r, ContentType::Handshake, &buf[..frag_len])
                .unwrap();
            let m = dec.decrypt(&mut buf[skip..], frag_len - skip, 0).unwrap();
            assert_eq!(&buf[skip..skip + m], b"abcd");
            assert_eq!(auth_r.sequence_number(), 1);
        }
    }

    #[test]
    fn test_aead_short_fragment_keeps_sequence() {
        let mut dec = CipherBox::new(
            ProtocolVersion::TLS12,
            CipherAlgId::Aes128Gcm,
            Direction::Decrypt,
            &[0u8; 16],
            &[0u8; 4],
        )
        .unwrap();
        let mut auth = Authenticator::null(ProtocolVersion::TLS12);
        assert!(matches!(
            dec.apply_explicit_nonce(&mut auth, ContentType::ApplicationData, &[0u8; 10]),
            Err(TlsError::BadRecordMac)
        ));
        assert_eq!(auth.sequence_number(), 0);
    }

    #[test]
    fn test_aead_requires_tls12() {
        assert!(CipherBox::new(
            ProtocolVersion::TLS11,
            CipherAlgId::Aes128Gcm,
            Direction::Encrypt,
            &[0u8; 16],
            &[0u8; 4],
        )
        .is_err());
    }

    #[test]
    fn test_stream_cipher_no_padding() {
        let key = [5u8; 16];
        let mut enc = CipherBox::new(ProtocolVersion::SSL30, CipherAlgId::Rc4_128, Direction::Encrypt, &key, &[]).unwrap();
        let mut dec = CipherBox::new(ProtocolVersion::SSL30, CipherAlgId::Rc4_128, Direction::Decrypt, &key, &[]).unwrap();
        assert_eq!(enc.block_size(), 0);
        let mut buf = *b"stream data";
        assert_eq!(enc.encrypt(&mut buf, 11).unwrap(), 11);
        assert_eq!(dec.decrypt(&mut buf, 11, 0).unwrap(), 11);
        assert_eq!(&buf, b"stream data");
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut enc, _) = cbc_pair(ProtocolVersion::TLS10, CipherAlgId::Aes128Cbc);
        enc.dispose();
        enc.dispose();
        assert!(enc.is_disposed());
        let mut buf = [0u8; 32];
        assert!(matches!(enc.encrypt(&mut buf, 3), Err(TlsError::Internal(_))));
    }

    #[test]
    fn test_sealed_fragment_len() {
        let (enc, _) = cbc_pair(ProtocolVersion::TLS10, CipherAlgId::Aes128Cbc);
        assert_eq!(enc.sealed_fragment_len(13, 0), 16);
        assert_eq!(enc.sealed_fragment_len(12, MacAlgId::Sha1.mac_len()), 48);
        let null = CipherBox::null(ProtocolVersion::TLS10);
        assert_eq!(null.sealed_fragment_len(12, 20), 32);
    }
}
