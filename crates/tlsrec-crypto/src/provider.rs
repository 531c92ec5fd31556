//! Trait-based provider interfaces consumed by the record layer.
//!
//! The record layer only ever needs init + update + final style access to
//! a bulk cipher and a keyed MAC; these traits pin down exactly that much.

use tlsrec_types::CryptoError;

/// Direction a cipher instance was initialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// A block cipher in CBC mode carrying its chaining state between calls.
pub trait BlockMode: Send {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Encrypt or decrypt (depending on the direction the instance was
    /// created for) whole blocks in place.
    ///
    /// `data.len()` must be a multiple of `block_size()`.
    fn process_blocks(&mut self, data: &mut [u8]) -> Result<(), CryptoError>;

    /// Release the cipher. No further calls are made after this.
    fn finalize(&mut self) -> Result<(), CryptoError> {
        Ok(())
    }
}

/// A stream cipher; encryption and decryption are the same operation.
pub trait StreamMode: Send {
    fn apply_keystream(&mut self, data: &mut [u8]);

    fn finalize(&mut self) -> Result<(), CryptoError> {
        Ok(())
    }
}

/// An Authenticated Encryption with Associated Data (AEAD) algorithm.
pub trait Aead: Send + Sync {
    /// The length of the authentication tag in bytes.
    fn tag_size(&self) -> usize;

    /// The expected nonce size in bytes.
    fn nonce_size(&self) -> usize;

    /// Encrypt `buf[..payload_len]` in place and write the tag right after
    /// it. Returns the ciphertext length including the tag.
    fn seal_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, CryptoError>;

    /// Decrypt `buf[..ciphertext_len]` (ciphertext followed by the tag) in
    /// place. Returns the plaintext length.
    fn open_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, CryptoError>;
}

/// A keyed record MAC (HMAC or the SSLv3 MAC construction).
pub trait RecordMac: Send {
    /// MAC output length in bytes.
    fn output_size(&self) -> usize;

    /// Compute the MAC over the concatenation of `parts`, writing
    /// `output_size()` bytes to `out`. The key schedule is reused, each
    /// call starts from a freshly keyed state.
    fn compute(&self, parts: &[&[u8]], out: &mut [u8]) -> Result<(), CryptoError>;
}
