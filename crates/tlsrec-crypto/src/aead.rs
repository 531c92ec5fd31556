//! AES-GCM and ChaCha20-Poly1305 behind the [`Aead`] trait.

use aes_gcm::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::ChaCha20Poly1305;
use tlsrec_types::{CipherAlgId, CryptoError};

use crate::provider::Aead;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn seal_with<C: AeadInPlace>(
    cipher: &C,
    nonce: &[u8],
    aad: &[u8],
    buf: &mut [u8],
    payload_len: usize,
) -> Result<usize, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidIvLength);
    }
    let need = payload_len + TAG_LEN;
    if buf.len() < need {
        return Err(CryptoError::BufferTooSmall {
            need,
            got: buf.len(),
        });
    }
    let (payload, rest) = buf.split_at_mut(payload_len);
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<C>::from_slice(nonce), aad, payload)
        .map_err(|_| CryptoError::InvalidArg)?;
    rest[..TAG_LEN].copy_from_slice(&tag);
    Ok(need)
}

fn open_with<C: AeadInPlace>(
    cipher: &C,
    nonce: &[u8],
    aad: &[u8],
    buf: &mut [u8],
    ciphertext_len: usize,
) -> Result<usize, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidIvLength);
    }
    if ciphertext_len < TAG_LEN || ciphertext_len > buf.len() {
        return Err(CryptoError::BufferTooSmall {
            need: TAG_LEN,
            got: ciphertext_len.min(buf.len()),
        });
    }
    let plain_len = ciphertext_len - TAG_LEN;
    let (payload, tag) = buf[..ciphertext_len].split_at_mut(plain_len);
    cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(nonce),
            aad,
            payload,
            Tag::<C>::from_slice(tag),
        )
        .map_err(|_| CryptoError::AeadTagVerifyFail)?;
    Ok(plain_len)
}

enum AeadState {
    Aes128Gcm(Box<Aes128Gcm>),
    Aes256Gcm(Box<Aes256Gcm>),
    ChaCha20Poly1305(Box<ChaCha20Poly1305>),
}

/// One of the TLS 1.2 AEAD ciphers, keyed for a single epoch direction.
pub struct RecordAead {
    state: AeadState,
}

impl RecordAead {
    pub fn new(alg: CipherAlgId, key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != alg.key_len() {
            return Err(CryptoError::InvalidKeyLength {
                expected: alg.key_len(),
                got: key.len(),
            });
        }
        let bad_key = |_| CryptoError::InvalidKeyLength {
            expected: alg.key_len(),
            got: key.len(),
        };
        let state = match alg {
            CipherAlgId::Aes128Gcm => {
                AeadState::Aes128Gcm(Box::new(Aes128Gcm::new_from_slice(key).map_err(bad_key)?))
            }
            CipherAlgId::Aes256Gcm => {
                AeadState::Aes256Gcm(Box::new(Aes256Gcm::new_from_slice(key).map_err(bad_key)?))
            }
            CipherAlgId::ChaCha20Poly1305 => AeadState::ChaCha20Poly1305(Box::new(
                ChaCha20Poly1305::new_from_slice(key).map_err(bad_key)?,
            )),
            _ => return Err(CryptoError::NotSupported),
        };
        Ok(Self { state })
    }
}

impl Aead for RecordAead {
    fn tag_size(&self) -> usize {
        TAG_LEN
    }

    fn nonce_size(&self) -> usize {
        NONCE_LEN
    }

    fn seal_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, CryptoError> {
        match &self.state {
            AeadState::Aes128Gcm(c) => seal_with(c.as_ref(), nonce, aad, buf, payload_len),
            AeadState::Aes256Gcm(c) => seal_with(c.as_ref(), nonce, aad, buf, payload_len),
            AeadState::ChaCha20Poly1305(c) => seal_with(c.as_ref(), nonce, aad, buf, payload_len),
        }
    }

    fn open_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, CryptoError> {
        match &self.state {
            AeadState::Aes128Gcm(c) => open_with(c.as_ref(), nonce, aad, buf, ciphertext_len),
            AeadState::Aes256Gcm(c) => open_with(c.as_ref(), nonce, aad, buf, ciphertext_len),
            AeadState::ChaCha20Poly1305(c) => {
                open_with(c.as_ref(), nonce, aad, buf, ciphertext_len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(alg: CipherAlgId) {
        let key = vec![0x42u8; alg.key_len()];
        let aead = RecordAead::new(alg, &key).unwrap();
        let nonce = [0x07u8; 12];
        let aad = b"header";
        let mut buf = vec![0u8; 5 + TAG_LEN];
        buf[..5].copy_from_slice(b"hello");

        let n = aead.seal_in_place(&nonce, aad, &mut buf, 5).unwrap();
        assert_eq!(n, 5 + TAG_LEN);
        assert_ne!(&buf[..5], b"hello");

        let m = aead.open_in_place(&nonce, aad, &mut buf, n).unwrap();
        assert_eq!(m, 5);
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn test_aes128_gcm_roundtrip() {
        roundtrip(CipherAlgId::Aes128Gcm);
    }

    #[test]
    fn test_aes256_gcm_roundtrip() {
        roundtrip(CipherAlgId::Aes256Gcm);
    }

    #[test]
    fn test_chacha20_poly1305_roundtrip() {
        roundtrip(CipherAlgId::ChaCha20Poly1305);
    }

    #[test]
    fn test_aead_wrong_aad_fails() {
        let aead = RecordAead::new(CipherAlgId::Aes128Gcm, &[1u8; 16]).unwrap();
        let nonce = [0u8; 12];
        let mut buf = vec![0u8; 4 + TAG_LEN];
        let n = aead.seal_in_place(&nonce, b"aad-1", &mut buf, 4).unwrap();
        assert!(matches!(
            aead.open_in_place(&nonce, b"aad-2", &mut buf, n),
            Err(CryptoError::AeadTagVerifyFail)
        ));
    }

    #[test]
    fn test_aead_short_ciphertext_rejected() {
        let aead = RecordAead::new(CipherAlgId::ChaCha20Poly1305, &[1u8; 32]).unwrap();
        let mut buf = vec![0u8; 8];
        assert!(aead.open_in_place(&[0u8; 12], b"", &mut buf, 8).is_err());
    }

    #[test]
    fn test_aead_rejects_non_aead_alg() {
        assert!(matches!(
            RecordAead::new(CipherAlgId::Aes128Cbc, &[0u8; 16]),
            Err(CryptoError::NotSupported)
        ));
    }
}
