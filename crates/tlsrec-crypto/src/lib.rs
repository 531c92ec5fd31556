#![forbid(unsafe_code)]
#![doc = "Cryptographic primitive provider for the tlsrec record layer."]

pub mod aead;
pub mod cipher;
pub mod mac;
pub mod provider;

pub use provider::{Aead, BlockMode, Direction, RecordMac, StreamMode};

use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha384};
use tlsrec_types::{CipherAlgId, CipherType, CryptoError, MacAlgId};

/// Create a CBC cipher for `alg` keyed with `key` and chaining from `iv`.
pub fn new_block_mode(
    alg: CipherAlgId,
    direction: Direction,
    key: &[u8],
    iv: &[u8],
) -> Result<Box<dyn BlockMode>, CryptoError> {
    if alg.cipher_type() != CipherType::Block {
        return Err(CryptoError::NotSupported);
    }
    Ok(Box::new(cipher::CbcMode::new(alg, direction, key, iv)?))
}

/// Create a stream cipher for `alg`.
pub fn new_stream_mode(alg: CipherAlgId, key: &[u8]) -> Result<Box<dyn StreamMode>, CryptoError> {
    match alg {
        CipherAlgId::Rc4_128 => Ok(Box::new(cipher::Rc4Mode::new(key)?)),
        _ => Err(CryptoError::NotSupported),
    }
}

/// Create an AEAD cipher for `alg`.
pub fn new_aead(alg: CipherAlgId, key: &[u8]) -> Result<Box<dyn Aead>, CryptoError> {
    Ok(Box::new(aead::RecordAead::new(alg, key)?))
}

/// Create the record MAC for `alg`.
///
/// `ssl3` selects the SSLv3 MAC construction, which exists only for MD5 and
/// SHA-1. TLS epochs use HMAC.
pub fn new_record_mac(
    alg: MacAlgId,
    ssl3: bool,
    key: &[u8],
) -> Result<Box<dyn RecordMac>, CryptoError> {
    if ssl3 {
        return match alg {
            MacAlgId::Md5 => Ok(Box::new(mac::Ssl3Mac::<Md5>::new(key, 48))),
            MacAlgId::Sha1 => Ok(Box::new(mac::Ssl3Mac::<Sha1>::new(key, 40))),
            _ => Err(CryptoError::NotSupported),
        };
    }
    match alg {
        MacAlgId::Md5 => Ok(Box::new(mac::HmacMac::<Md5>::new(key)?)),
        MacAlgId::Sha1 => Ok(Box::new(mac::HmacMac::<Sha1>::new(key)?)),
        MacAlgId::Sha256 => Ok(Box::new(mac::HmacMac::<Sha256>::new(key)?)),
        MacAlgId::Sha384 => Ok(Box::new(mac::HmacMac::<Sha384>::new(key)?)),
        MacAlgId::Null => Err(CryptoError::NotSupported),
    }
}
