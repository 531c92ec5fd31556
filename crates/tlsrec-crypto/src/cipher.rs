//! CBC block modes and the RC4 stream cipher, backed by RustCrypto.

use aes::{Aes128, Aes256};
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use rc4::consts::U16;
use rc4::{KeyInit, Rc4, StreamCipher};
use tlsrec_types::{CipherAlgId, CryptoError};

use crate::provider::{BlockMode, Direction, StreamMode};

enum CbcState {
    Aes128Enc(cbc::Encryptor<Aes128>),
    Aes128Dec(cbc::Decryptor<Aes128>),
    Aes256Enc(cbc::Encryptor<Aes256>),
    Aes256Dec(cbc::Decryptor<Aes256>),
    TdesEnc(cbc::Encryptor<TdesEde3>),
    TdesDec(cbc::Decryptor<TdesEde3>),
}

macro_rules! encrypt_chunks {
    ($mode:expr, $data:expr, $bs:expr) => {
        for chunk in $data.chunks_exact_mut($bs) {
            $mode.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    };
}

macro_rules! decrypt_chunks {
    ($mode:expr, $data:expr, $bs:expr) => {
        for chunk in $data.chunks_exact_mut($bs) {
            $mode.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    };
}

/// CBC mode over AES-128/256 or 3DES-EDE with chaining carried across
/// records, as SSLv3 and TLS 1.0 require.
pub struct CbcMode {
    state: CbcState,
    block_size: usize,
}

impl CbcMode {
    pub fn new(
        alg: CipherAlgId,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
    ) -> Result<Self, CryptoError> {
        let block_size = alg.block_size();
        if key.len() != alg.key_len() {
            return Err(CryptoError::InvalidKeyLength {
                expected: alg.key_len(),
                got: key.len(),
            });
        }
        if block_size == 0 || iv.len() != block_size {
            return Err(CryptoError::InvalidIvLength);
        }
        let bad_len = |_| CryptoError::InvalidArg;
        let state = match (alg, direction) {
            (CipherAlgId::Aes128Cbc, Direction::Encrypt) => {
                CbcState::Aes128Enc(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            (CipherAlgId::Aes128Cbc, Direction::Decrypt) => {
                CbcState::Aes128Dec(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            (CipherAlgId::Aes256Cbc, Direction::Encrypt) => {
                CbcState::Aes256Enc(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            (CipherAlgId::Aes256Cbc, Direction::Decrypt) => {
                CbcState::Aes256Dec(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            (CipherAlgId::DesEde3Cbc, Direction::Encrypt) => {
                CbcState::TdesEnc(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            (CipherAlgId::DesEde3Cbc, Direction::Decrypt) => {
                CbcState::TdesDec(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_len)?)
            }
            _ => return Err(CryptoError::NotSupported),
        };
        Ok(Self { state, block_size })
    }
}

impl BlockMode for CbcMode {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn process_blocks(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        if data.len() % self.block_size != 0 {
            return Err(CryptoError::NotBlockAligned);
        }
        let bs = self.block_size;
        match &mut self.state {
            CbcState::Aes128Enc(m) => encrypt_chunks!(m, data, bs),
            CbcState::Aes128Dec(m) => decrypt_chunks!(m, data, bs),
            CbcState::Aes256Enc(m) => encrypt_chunks!(m, data, bs),
            CbcState::Aes256Dec(m) => decrypt_chunks!(m, data, bs),
            CbcState::TdesEnc(m) => encrypt_chunks!(m, data, bs),
            CbcState::TdesDec(m) => decrypt_chunks!(m, data, bs),
        }
        Ok(())
    }
}

/// RC4 with a 128-bit key.
pub struct Rc4Mode {
    cipher: Rc4<U16>,
}

impl Rc4Mode {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = Rc4::<U16>::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: 16,
            got: key.len(),
        })?;
        Ok(Self { cipher })
    }
}

impl StreamMode for Rc4Mode {
    fn apply_keystream(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }
}
