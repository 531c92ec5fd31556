use std::fmt;

/// Record protocol version as carried on the wire (`major.minor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    /// Version marker used inside an SSLv2-compatible ClientHello.
    pub const SSL20_HELLO: Self = Self::new(0x00, 0x02);
    pub const SSL30: Self = Self::new(0x03, 0x00);
    pub const TLS10: Self = Self::new(0x03, 0x01);
    pub const TLS11: Self = Self::new(0x03, 0x02);
    pub const TLS12: Self = Self::new(0x03, 0x03);

    /// Lowest version the record layer will frame.
    pub const MIN: Self = Self::SSL30;
    /// Highest version the record layer will frame.
    pub const MAX: Self = Self::TLS12;

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn from_u16(v: u16) -> Self {
        Self::new((v >> 8) as u8, v as u8)
    }

    pub const fn as_u16(self) -> u16 {
        ((self.major as u16) << 8) | self.minor as u16
    }

    /// True for TLS 1.0 and later (HMAC, strict CBC padding).
    pub fn is_tls(self) -> bool {
        self >= Self::TLS10
    }

    /// True when CBC records carry an explicit per-record IV (TLS 1.1+).
    pub fn uses_explicit_iv(self) -> bool {
        self >= Self::TLS11
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SSL20_HELLO => f.write_str("SSLv2Hello"),
            Self::SSL30 => f.write_str("SSLv3"),
            Self::TLS10 => f.write_str("TLSv1"),
            Self::TLS11 => f.write_str("TLSv1.1"),
            Self::TLS12 => f.write_str("TLSv1.2"),
            v => write!(f, "Unknown-{}.{}", v.major, v.minor),
        }
    }
}

/// How a bulk cipher protects a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherType {
    Null,
    Stream,
    Block,
    Aead,
}

/// Bulk cipher algorithm identifiers (algorithm + mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgId {
    Null,
    Rc4_128,
    DesEde3Cbc,
    Aes128Cbc,
    Aes256Cbc,
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl CipherAlgId {
    pub fn cipher_type(self) -> CipherType {
        match self {
            Self::Null => CipherType::Null,
            Self::Rc4_128 => CipherType::Stream,
            Self::DesEde3Cbc | Self::Aes128Cbc | Self::Aes256Cbc => CipherType::Block,
            Self::Aes128Gcm | Self::Aes256Gcm | Self::ChaCha20Poly1305 => CipherType::Aead,
        }
    }

    pub fn key_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Rc4_128 | Self::Aes128Cbc | Self::Aes128Gcm => 16,
            Self::DesEde3Cbc => 24,
            Self::Aes256Cbc | Self::Aes256Gcm | Self::ChaCha20Poly1305 => 32,
        }
    }

    /// Cipher block size; 0 for stream and AEAD ciphers.
    pub fn block_size(self) -> usize {
        match self {
            Self::DesEde3Cbc => 8,
            Self::Aes128Cbc | Self::Aes256Cbc => 16,
            _ => 0,
        }
    }

    /// Length of the IV derived from the key block.
    ///
    /// For CBC this is the initial chaining value, for GCM the 4-byte
    /// implicit salt and for ChaCha20-Poly1305 the full 12-byte nonce mask.
    pub fn fixed_iv_len(self) -> usize {
        match self {
            Self::Null | Self::Rc4_128 => 0,
            Self::DesEde3Cbc => 8,
            Self::Aes128Cbc | Self::Aes256Cbc => 16,
            Self::Aes128Gcm | Self::Aes256Gcm => 4,
            Self::ChaCha20Poly1305 => 12,
        }
    }

    /// Bytes of explicit nonce sent with each AEAD record.
    pub fn record_iv_len(self) -> usize {
        match self {
            Self::Aes128Gcm | Self::Aes256Gcm => 8,
            _ => 0,
        }
    }

    /// AEAD authentication tag length; 0 for non-AEAD ciphers.
    pub fn tag_len(self) -> usize {
        match self.cipher_type() {
            CipherType::Aead => 16,
            _ => 0,
        }
    }
}

/// Record MAC algorithm identifiers.
///
/// SSLv3 epochs use the SSL MAC construction over the named hash, TLS
/// epochs use HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgId {
    Null,
    Md5,
    Sha1,
    Sha256,
    Sha384,
}

impl MacAlgId {
    /// MAC output length in bytes.
    pub fn mac_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
        }
    }

    /// Input block length of the underlying hash compression function.
    pub fn hash_block_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Md5 | Self::Sha1 | Self::Sha256 => 64,
            Self::Sha384 => 128,
        }
    }

    /// Minimal number of padding bytes the hash appends to its last block
    /// (the 0x80 marker plus the encoded message length).
    pub fn minimal_padding_len(self) -> usize {
        match self {
            Self::Null => 0,
            Self::Md5 | Self::Sha1 | Self::Sha256 => 9,
            Self::Sha384 => 17,
        }
    }
}
