//! Conversion of an SSLv2-format ClientHello into a V3 ClientHello.
//!
//! V2 message layout (after the 2-byte record header):
//! msg_type(1) || version(2) || cipher_specs_len(2) || session_id_len(2) ||
//! challenge_len(2) || cipher_specs(3 each) || session_id || challenge

use tlsrec_types::{ProtocolVersion, TlsError};

use super::{ContentType, InboundRecord};
use crate::handshake::codec::{encode_client_hello, ClientHello, HandshakeReader};

const V2_CIPHER_SPEC_LEN: usize = 3;
const MAX_SESSION_ID_LEN: usize = 32;
const RANDOM_LEN: usize = 32;

/// Convert a V2 ClientHello message into an equivalent V3 handshake record.
///
/// Only V2 cipher specs that name a V3 suite (first byte zero) are kept.
/// The challenge becomes the client random, right-aligned and zero padded.
pub(crate) fn convert_client_hello(v2: &[u8]) -> Result<InboundRecord, TlsError> {
    let malformed = |what: &str| TlsError::RecordError(format!("malformed SSLv2 ClientHello: {what}"));

    let mut r = HandshakeReader::new(v2);
    let msg_type = r.get_u8().map_err(|_| malformed("truncated"))?;
    if msg_type != 1 {
        return Err(malformed("not a ClientHello"));
    }
    let (major, minor, specs_len, sid_len, challenge_len) =
        read_lengths(&mut r).map_err(|_| malformed("truncated header"))?;

    if specs_len % V2_CIPHER_SPEC_LEN != 0 {
        return Err(malformed("cipher spec length"));
    }
    if sid_len > MAX_SESSION_ID_LEN {
        return Err(malformed("session id length"));
    }
    if specs_len + sid_len + challenge_len > r.remaining() {
        return Err(malformed("lengths exceed message"));
    }
    let specs = r.get_raw(specs_len)?;
    let session_id = r.get_raw(sid_len)?;
    let challenge = r.get_raw(challenge_len)?;

    let cipher_suites = specs
        .chunks_exact(V2_CIPHER_SPEC_LEN)
        .filter(|spec| spec[0] == 0)
        .map(|spec| u16::from_be_bytes([spec[1], spec[2]]))
        .collect();

    let mut random = [0u8; RANDOM_LEN];
    if challenge.len() >= RANDOM_LEN {
        random.copy_from_slice(&challenge[challenge.len() - RANDOM_LEN..]);
    } else {
        random[RANDOM_LEN - challenge.len()..].copy_from_slice(challenge);
    }

    let client_version = ProtocolVersion::new(major, minor);
    let hello = ClientHello {
        client_version,
        random,
        session_id: session_id.to_vec(),
        cipher_suites,
        compression_methods: vec![0],
    };
    Ok(InboundRecord {
        content_type: ContentType::Handshake,
        version: client_version,
        payload: encode_client_hello(&hello)?,
        legacy_v2_hello: Some(v2.to_vec()),
    })
}

fn read_lengths(r: &mut HandshakeReader<'_>) -> Result<(u8, u8, usize, usize, usize), TlsError> {
    Ok((
        r.get_u8()?,
        r.get_u8()?,
        r.get_u16()? as usize,
        r.get_u16()? as usize,
        r.get_u16()? as usize,
    ))
}
