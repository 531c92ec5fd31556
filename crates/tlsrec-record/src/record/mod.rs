//! TLS record layer: framing, epochs and record protection.

pub mod authenticator;
pub mod cipher_box;
pub mod framing;
pub mod input;
pub mod limits;
pub mod output;
pub mod protect;
pub mod state;
mod v2hello;

use tlsrec_crypto::Direction;
use tlsrec_types::{CipherAlgId, MacAlgId, ProtocolVersion, TlsError};

use authenticator::Authenticator;
use cipher_box::CipherBox;
use limits::HEADER_SIZE;

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(v),
        }
    }
}

/// A parsed 5-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub length: usize,
}

impl RecordHeader {
    /// Parse the header at the start of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, TlsError> {
        if data.len() < HEADER_SIZE {
            return Err(TlsError::RecordError("incomplete record header".into()));
        }
        let content_type = ContentType::from_u8(data[0])
            .map_err(|v| TlsError::UnexpectedMessage(format!("unknown content type {v}")))?;
        Ok(Self {
            content_type,
            version: ProtocolVersion::new(data[1], data[2]),
            length: u16::from_be_bytes([data[3], data[4]]) as usize,
        })
    }

    /// Write the header into `out[..5]`.
    pub fn encode(&self, out: &mut [u8]) -> Result<(), TlsError> {
        if out.len() < HEADER_SIZE {
            return Err(TlsError::Internal("no room for record header".into()));
        }
        let length = u16::try_from(self.length)
            .map_err(|_| TlsError::RecordOverflow(format!("record length {}", self.length)))?;
        out[0] = self.content_type as u8;
        out[1] = self.version.major;
        out[2] = self.version.minor;
        out[3..5].copy_from_slice(&length.to_be_bytes());
        Ok(())
    }
}

/// A verified, decrypted record handed to the handshake layer or the
/// application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub payload: Vec<u8>,
    /// For a converted SSLv2 ClientHello, the original V2 message bytes
    /// (the handshake transcript covers these, not the converted form).
    pub legacy_v2_hello: Option<Vec<u8>>,
}

/// Negotiated key material for one direction of one epoch.
pub struct EpochKeys<'a> {
    pub version: ProtocolVersion,
    pub cipher: CipherAlgId,
    pub mac: MacAlgId,
    pub key: &'a [u8],
    pub iv: &'a [u8],
    pub mac_key: &'a [u8],
}

/// The cipher and authenticator protecting one direction of one epoch.
#[derive(Debug)]
pub struct Epoch {
    pub cipher: CipherBox,
    pub auth: Authenticator,
}

impl Epoch {
    pub fn new(cipher: CipherBox, auth: Authenticator) -> Self {
        Self { cipher, auth }
    }

    /// The unprotected epoch in effect before the first ChangeCipherSpec.
    pub fn null(version: ProtocolVersion) -> Self {
        Self {
            cipher: CipherBox::null(version),
            auth: Authenticator::null(version),
        }
    }

    /// Build an epoch from negotiated keys.
    pub fn from_keys(keys: &EpochKeys<'_>, direction: Direction) -> Result<Self, TlsError> {
        let cipher = CipherBox::new(keys.version, keys.cipher, direction, keys.key, keys.iv)?;
        let auth = if keys.cipher.tag_len() > 0 {
            Authenticator::null(keys.version)
        } else {
            Authenticator::new(keys.version, keys.mac, keys.mac_key)?
        };
        Ok(Self { cipher, auth })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.cipher.version()
    }

    /// Size of the record produced by sealing `payload_len` bytes.
    pub fn sealed_len(&self, payload_len: usize) -> usize {
        HEADER_SIZE + self.cipher.sealed_fragment_len(payload_len, self.auth.tag_len())
    }
}
