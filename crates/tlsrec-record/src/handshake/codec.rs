//! Handshake wire primitives: the 4-byte message header, length-prefixed
//! vectors and the TLS 1.2 ClientHello body.

use tlsrec_types::{ProtocolVersion, TlsError};

use super::HandshakeType;

/// Largest value of a 24-bit length field.
const MAX_U24: usize = 0x00FF_FFFF;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// ClientHello message (no extensions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Handshake header
// ---------------------------------------------------------------------------

/// Parse a handshake header: msg_type(1) || length(3).
/// Returns (HandshakeType, body_slice, total_bytes_consumed).
pub fn parse_handshake_header(data: &[u8]) -> Result<(HandshakeType, &[u8], usize), TlsError> {
    if data.len() < 4 {
        return Err(TlsError::HandshakeFailed(
            "handshake header too short".into(),
        ));
    }
    let msg_type = HandshakeType::from_u8(data[0])
        .map_err(|v| TlsError::HandshakeFailed(format!("unknown handshake type: {v}")))?;
    let length = ((data[1] as usize) << 16) | ((data[2] as usize) << 8) | (data[3] as usize);
    let total = 4 + length;
    if data.len() < total {
        return Err(TlsError::HandshakeFailed(
            "handshake message body truncated".into(),
        ));
    }
    Ok((msg_type, &data[4..total], total))
}

/// Wrap a handshake body with the 4-byte header.
pub fn wrap_handshake(msg_type: HandshakeType, body: &[u8]) -> Result<Vec<u8>, TlsError> {
    let mut w = HandshakeWriter::with_capacity(4 + body.len());
    w.put_u8(msg_type as u8);
    w.put_bytes24(body)?;
    Ok(w.finish())
}

// ---------------------------------------------------------------------------
// Reader / writer
// ---------------------------------------------------------------------------

/// Cursor over handshake bytes. Every read is bounds-checked.
#[derive(Debug, Clone)]
pub struct HandshakeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HandshakeReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes.
    pub fn get_raw(&mut self, n: usize) -> Result<&'a [u8], TlsError> {
        if n > self.remaining() {
            return Err(TlsError::HandshakeFailed(format!(
                "truncated message: need {n} bytes, {} remaining",
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, TlsError> {
        Ok(self.get_raw(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, TlsError> {
        let b = self.get_raw(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn get_u24(&mut self) -> Result<u32, TlsError> {
        let b = self.get_raw(3)?;
        Ok(read_u24(b))
    }

    pub fn get_u32(&mut self) -> Result<u32, TlsError> {
        let b = self.get_raw(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// A vector with a one-byte length prefix.
    pub fn get_bytes8(&mut self) -> Result<&'a [u8], TlsError> {
        let n = self.get_u8()? as usize;
        self.get_raw(n)
    }

    pub fn get_bytes16(&mut self) -> Result<&'a [u8], TlsError> {
        let n = self.get_u16()? as usize;
        self.get_raw(n)
    }

    pub fn get_bytes24(&mut self) -> Result<&'a [u8], TlsError> {
        let n = self.get_u24()? as usize;
        self.get_raw(n)
    }
}

/// Growable handshake encoder.
#[derive(Debug, Clone, Default)]
pub struct HandshakeWriter {
    buf: Vec<u8>,
}

impl HandshakeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u24(&mut self, v: u32) -> Result<(), TlsError> {
        if v as usize > MAX_U24 {
            return Err(TlsError::Internal(format!("{v} does not fit in 24 bits")));
        }
        self.buf.extend_from_slice(&v.to_be_bytes()[1..]);
        Ok(())
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bytes8(&mut self, data: &[u8]) -> Result<(), TlsError> {
        let n = u8::try_from(data.len())
            .map_err(|_| TlsError::Internal(format!("vector of {} bytes exceeds 2^8", data.len())))?;
        self.put_u8(n);
        self.put_raw(data);
        Ok(())
    }

    pub fn put_bytes16(&mut self, data: &[u8]) -> Result<(), TlsError> {
        let n = u16::try_from(data.len())
            .map_err(|_| TlsError::Internal(format!("vector of {} bytes exceeds 2^16", data.len())))?;
        self.put_u16(n);
        self.put_raw(data);
        Ok(())
    }

    pub fn put_bytes24(&mut self, data: &[u8]) -> Result<(), TlsError> {
        self.put_u24(data.len() as u32)?;
        self.put_raw(data);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ClientHello
// ---------------------------------------------------------------------------

/// Encode a ClientHello as a complete handshake message (header + body).
pub fn encode_client_hello(ch: &ClientHello) -> Result<Vec<u8>, TlsError> {
    let mut body = HandshakeWriter::with_capacity(128);
    body.put_u8(ch.client_version.major);
    body.put_u8(ch.client_version.minor);
    body.put_raw(&ch.random);
    body.put_bytes8(&ch.session_id)?;
    let mut suites = HandshakeWriter::with_capacity(ch.cipher_suites.len() * 2);
    for s in &ch.cipher_suites {
        suites.put_u16(*s);
    }
    body.put_bytes16(suites.as_slice())?;
    body.put_bytes8(&ch.compression_methods)?;
    wrap_handshake(HandshakeType::ClientHello, body.as_slice())
}

/// Decode a ClientHello body (after the 4-byte header). Extensions, if
/// present, are skipped.
pub fn decode_client_hello(body: &[u8]) -> Result<ClientHello, TlsError> {
    let mut r = HandshakeReader::new(body);
    let client_version = ProtocolVersion::new(r.get_u8()?, r.get_u8()?);
    let mut random = [0u8; 32];
    random.copy_from_slice(r.get_raw(32)?);
    let session_id = r.get_bytes8()?.to_vec();
    if session_id.len() > 32 {
        return Err(TlsError::HandshakeFailed("session id too long".into()));
    }
    let suites = r.get_bytes16()?;
    if suites.len() % 2 != 0 {
        return Err(TlsError::HandshakeFailed("odd cipher suite list length".into()));
    }
    let cipher_suites = suites
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let compression_methods = r.get_bytes8()?.to_vec();
    Ok(ClientHello {
        client_version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
    })
}

/// Read a 3-byte big-endian integer.
fn read_u24(data: &[u8]) -> u32 {
    ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
