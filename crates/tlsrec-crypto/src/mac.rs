//! Record MACs: HMAC for TLS epochs and the SSLv3 MAC construction.

use std::marker::PhantomData;

use digest::core_api::BlockSizeUser;
use digest::Digest;
use hmac::{Mac, SimpleHmac};
use tlsrec_types::CryptoError;
use zeroize::Zeroize;

use crate::provider::RecordMac;

/// HMAC over any RustCrypto digest. The keyed state is cloned per record.
pub struct HmacMac<D>
where
    D: Digest + BlockSizeUser + Clone,
{
    keyed: SimpleHmac<D>,
}

impl<D> HmacMac<D>
where
    D: Digest + BlockSizeUser + Clone,
{
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let keyed = <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidArg)?;
        Ok(Self { keyed })
    }
}

impl<D> RecordMac for HmacMac<D>
where
    D: Digest + BlockSizeUser + Clone + Send,
{
    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn compute(&self, parts: &[&[u8]], out: &mut [u8]) -> Result<(), CryptoError> {
        let n = self.output_size();
        if out.len() < n {
            return Err(CryptoError::BufferTooSmall {
                need: n,
                got: out.len(),
            });
        }
        let mut mac = self.keyed.clone();
        for part in parts {
            Mac::update(&mut mac, part);
        }
        out[..n].copy_from_slice(&mac.finalize().into_bytes());
        Ok(())
    }
}

/// SSLv3 MAC: `hash(secret || pad2 || hash(secret || pad1 || data))`.
///
/// The pad length is 48 bytes for MD5 and 40 for SHA-1.
pub struct Ssl3Mac<D> {
    secret: Vec<u8>,
    pad_len: usize,
    _digest: PhantomData<fn() -> D>,
}

const PAD1: u8 = 0x36;
const PAD2: u8 = 0x5c;

impl<D: Digest> Ssl3Mac<D> {
    pub fn new(secret: &[u8], pad_len: usize) -> Self {
        Self {
            secret: secret.to_vec(),
            pad_len,
            _digest: PhantomData,
        }
    }
}

impl<D> Drop for Ssl3Mac<D> {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl<D: Digest> RecordMac for Ssl3Mac<D> {
    fn output_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn compute(&self, parts: &[&[u8]], out: &mut [u8]) -> Result<(), CryptoError> {
        let n = self.output_size();
        if out.len() < n {
            return Err(CryptoError::BufferTooSmall {
                need: n,
                got: out.len(),
            });
        }
        let pad1 = [PAD1; 48];
        let pad2 = [PAD2; 48];

        let mut inner = D::new();
        inner.update(&self.secret);
        inner.update(&pad1[..self.pad_len]);
        for part in parts {
            inner.update(part);
        }
        let inner_hash = inner.finalize();

        let mut outer = D::new();
        outer.update(&self.secret);
        outer.update(&pad2[..self.pad_len]);
        outer.update(&inner_hash);
        out[..n].copy_from_slice(&outer.finalize());
        Ok(())
    }
}
