//! Per-direction record authentication state.
//!
//! An [`Authenticator`] owns the sequence number of one epoch direction and,
//! for MAC-then-encrypt suites, the keyed record MAC. AEAD suites use a
//! MAC-less authenticator for the sequence number and additional data.

use std::ops::Deref;

use subtle::ConstantTimeEq;
use tlsrec_crypto::RecordMac;
use tlsrec_types::{MacAlgId, ProtocolVersion, TlsError};

use super::ContentType;

/// seq(8) || type(1) || length(2)
const SSL3_AUTH_BLOCK_LEN: usize = 11;
/// seq(8) || type(1) || major(1) || minor(1) || length(2)
const TLS_AUTH_BLOCK_LEN: usize = 13;

/// Sequence numbers at or above this value should trigger a rekey.
const HUGE_SEQUENCE: u64 = 0xFFFF_0000_0000_0000;

/// The additional data block mixed into a record MAC or AEAD.
#[derive(Debug, Clone, Copy)]
pub struct AuthBytes {
    block: [u8; TLS_AUTH_BLOCK_LEN],
    len: usize,
}

impl AuthBytes {
    /// The explicit sequence number this block was built from.
    pub fn sequence_bytes(&self) -> [u8; 8] {
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&self.block[..8]);
        seq
    }
}

impl Deref for AuthBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.block[..self.len]
    }
}

/// Outcome of a full-length tag comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagComparison {
    pub missed: usize,
    pub matched: usize,
}

impl TagComparison {
    pub fn is_match(&self) -> bool {
        self.missed == 0
    }

    /// Number of byte comparisons performed.
    pub fn comparisons(&self) -> usize {
        self.missed + self.matched
    }
}

/// Compare every byte of `computed` against `received`.
///
/// The scan never stops early; a missing received byte counts as a miss.
pub fn compare_mac_tags(received: &[u8], computed: &[u8]) -> TagComparison {
    let mut result = TagComparison::default();
    for (i, c) in computed.iter().enumerate() {
        let r = received.get(i).copied().unwrap_or(!*c);
        let eq = r.ct_eq(c).unwrap_u8() as usize;
        result.matched += eq;
        result.missed += 1 - eq;
    }
    result
}

fn ceil_div(a: i64, b: i64) -> i64 {
    (a + b - 1).div_euclid(b)
}

pub struct Authenticator {
    version: ProtocolVersion,
    sequence: u64,
    mac_alg: MacAlgId,
    mac: Option<Box<dyn RecordMac>>,
    /// Backing store for simulated MAC passes.
    scratch: Vec<u8>,
    mac_calls: u64,
    simulated_calls: u64,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("version", &self.version)
            .field("sequence", &self.sequence)
            .field("mac_alg", &self.mac_alg)
            .finish()
    }
}

impl Authenticator {
    /// An authenticator without a MAC (null epochs and AEAD suites).
    pub fn null(version: ProtocolVersion) -> Self {
        Self {
            version,
            sequence: 0,
            mac_alg: MacAlgId::Null,
            mac: None,
            scratch: Vec::new(),
            mac_calls: 0,
            simulated_calls: 0,
        }
    }

    /// A MAC authenticator for `version`. SSLv3 selects the SSL MAC
    /// construction, later versions HMAC.
    pub fn new(version: ProtocolVersion, mac_alg: MacAlgId, key: &[u8]) -> Result<Self, TlsError> {
        if mac_alg == MacAlgId::Null {
            return Ok(Self::null(version));
        }
        let mac = tlsrec_crypto::new_record_mac(mac_alg, !version.is_tls(), key)?;
        let mut auth = Self::null(version);
        auth.mac_alg = mac_alg;
        auth.mac = Some(mac);
        Ok(auth)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn mac_alg(&self) -> MacAlgId {
        self.mac_alg
    }

    pub fn has_mac(&self) -> bool {
        self.mac.is_some()
    }

    /// MAC tag length; 0 without a MAC.
    pub fn tag_len(&self) -> usize {
        self.mac.as_ref().map_or(0, |m| m.output_size())
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence
    }

    /// Build the authentication block for the next record and consume its
    /// sequence number.
    pub fn acquire_authentication_bytes(&mut self, content_type: ContentType, length: usize) -> AuthBytes {
        let mut block = [0u8; TLS_AUTH_BLOCK_LEN];
        block[..8].copy_from_slice(&self.sequence.to_be_bytes());
        block[8] = content_type as u8;
        let len_bytes = (length as u16).to_be_bytes();
        let len = if self.version.is_tls() {
            block[9] = self.version.major;
            block[10] = self.version.minor;
            block[11..13].copy_from_slice(&len_bytes);
            TLS_AUTH_BLOCK_LEN
        } else {
            block[9..11].copy_from_slice(&len_bytes);
            SSL3_AUTH_BLOCK_LEN
        };
        self.advance();
        AuthBytes { block, len }
    }

    /// Consume a sequence number without producing a block.
    pub fn advance(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
    }

    /// Compute the MAC over `data`.
    ///
    /// A real computation mixes in the authentication block and consumes a
    /// sequence number. A simulated one covers `data` alone and leaves the
    /// sequence number untouched; it only exists to spend the same work.
    /// Without a MAC the result is empty, a real call still consumes a
    /// sequence number.
    pub fn compute(
        &mut self,
        content_type: ContentType,
        data: &[u8],
        simulated: bool,
    ) -> Result<Vec<u8>, TlsError> {
        if self.mac.is_none() {
            if !simulated {
                self.advance();
            }
            return Ok(Vec::new());
        }
        let header = if simulated {
            None
        } else {
            Some(self.acquire_authentication_bytes(content_type, data.len()))
        };
        let mac = match self.mac.as_ref() {
            Some(mac) => mac,
            None => return Ok(Vec::new()),
        };
        let mut tag = vec![0u8; mac.output_size()];
        match &header {
            Some(h) => mac.compute(&[&**h, data], &mut tag)?,
            None => mac.compute(&[data], &mut tag)?,
        }
        if simulated {
            self.simulated_calls += 1;
        } else {
            self.mac_calls += 1;
        }
        Ok(tag)
    }

    /// MAC `data` and compare the result against `received`.
    /// Returns `true` when the tags differ.
    pub fn check_mac_tags(
        &mut self,
        content_type: ContentType,
        data: &[u8],
        received: &[u8],
        simulated: bool,
    ) -> Result<bool, TlsError> {
        let tag = self.compute(content_type, data, simulated)?;
        if tag.len() != self.tag_len() {
            return Err(TlsError::Internal("unexpected MAC length".into()));
        }
        Ok(!compare_mac_tags(received, &tag).is_match())
    }

    /// Length of the simulated pass that tops up the MAC work for a CBC
    /// record whose MAC covered `used_len` of `full_len` ciphertext bytes.
    pub fn remainder_len(&self, full_len: usize, used_len: usize) -> usize {
        let block = self.mac_alg.hash_block_len() as i64;
        if block == 0 {
            return 0;
        }
        let shift = TLS_AUTH_BLOCK_LEN as i64 - (block - self.mac_alg.minimal_padding_len() as i64);
        let full = full_len as i64 + shift;
        let used = used_len as i64 + shift;
        let blocks = (ceil_div(full, block) - ceil_div(used, block)).max(0);
        (1 + blocks * block) as usize
    }

    /// Run a simulated MAC check over `len` bytes of internal scratch.
    pub(crate) fn simulate_remainder(&mut self, content_type: ContentType, len: usize) -> Result<(), TlsError> {
        let tag_len = self.tag_len();
        let mut scratch = std::mem::take(&mut self.scratch);
        if scratch.len() < len + tag_len {
            scratch.resize(len + tag_len, 0);
        }
        let result = self.check_mac_tags(
            content_type,
            &scratch[..len],
            &scratch[len..len + tag_len],
            true,
        );
        self.scratch = scratch;
        result.map(|_| ())
    }

    /// The sequence number is exhausted; no further records may be sent.
    pub fn seq_num_overflow(&self) -> bool {
        self.sequence == u64::MAX
    }

    /// The sequence number is close to wrapping; the connection should
    /// renegotiate or close.
    pub fn seq_num_is_huge(&self) -> bool {
        self.sequence >= HUGE_SEQUENCE
    }

    /// Real MAC computations performed.
    pub fn mac_invocations(&self) -> u64 {
        self.mac_calls
    }

    /// Simulated MAC computations performed.
    pub fn simulated_invocations(&self) -> u64 {
        self.simulated_calls
    }

    #[cfg(test)]
    pub(crate) fn set_sequence_number(&mut self, seq: u64) {
        self.sequence = seq;
    }
}
