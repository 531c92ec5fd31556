//! Record protection shared by the stream and engine paths.
//!
//! `seal` is MAC-then-encrypt (or AEAD) into a caller-laid-out record
//! buffer. `open` decrypts a fragment in place and verifies it; padding
//! and MAC failures are both reported as one `BadRecordMac`, only after
//! the MAC work for the record has been done.

use std::ops::Range;

use tlsrec_types::{ProtocolVersion, TlsError};

use super::limits::HEADER_SIZE;
use super::{ContentType, Epoch, RecordHeader};

/// Seal `len` plaintext bytes into a record.
///
/// Layout of `record` on entry: `[0..5)` header (written here),
/// `[5..5+n)` explicit nonce (written here), `[5+n..5+n+len)` plaintext,
/// where `n` is the cipher's explicit nonce size. `record` must hold at
/// least `epoch.sealed_len(len)` bytes. Returns the record length.
pub fn seal(
    epoch: &mut Epoch,
    content_type: ContentType,
    version: ProtocolVersion,
    record: &mut [u8],
    len: usize,
) -> Result<usize, TlsError> {
    let need = epoch.sealed_len(len);
    if record.len() < need {
        return Err(TlsError::Internal(format!(
            "record buffer too small: need {need}, got {}",
            record.len()
        )));
    }
    let nonce_size = epoch.cipher.explicit_nonce_size();
    let start = HEADER_SIZE + nonce_size;
    let aead = epoch.cipher.is_aead_mode();

    let mut body_len = len;
    if !aead {
        let tag = epoch
            .auth
            .compute(content_type, &record[start..start + len], false)?;
        record[start + len..start + len + tag.len()].copy_from_slice(&tag);
        body_len += tag.len();
    }

    let (head, rest) = record.split_at_mut(HEADER_SIZE);
    epoch
        .cipher
        .create_explicit_nonce(&mut epoch.auth, content_type, body_len, &mut rest[..nonce_size])?;
    let fragment_len = if aead {
        nonce_size + epoch.cipher.encrypt(&mut rest[nonce_size..], body_len)?
    } else {
        epoch.cipher.encrypt(rest, nonce_size + body_len)?
    };

    RecordHeader {
        content_type,
        version,
        length: fragment_len,
    }
    .encode(head)?;
    Ok(HEADER_SIZE + fragment_len)
}

/// Seal `payload` into a freshly allocated record.
pub fn seal_to_vec(
    epoch: &mut Epoch,
    content_type: ContentType,
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<Vec<u8>, TlsError> {
    let mut record = vec![0u8; epoch.sealed_len(payload.len())];
    let start = HEADER_SIZE + epoch.cipher.explicit_nonce_size();
    record[start..start + payload.len()].copy_from_slice(payload);
    let n = seal(epoch, content_type, version, &mut record, payload.len())?;
    record.truncate(n);
    Ok(record)
}

/// Decrypt and verify a record fragment in place.
///
/// Consumes exactly one sequence number whatever the outcome. Returns the
/// plaintext range within `fragment`.
pub fn open(
    epoch: &mut Epoch,
    content_type: ContentType,
    fragment: &mut [u8],
) -> Result<Range<usize>, TlsError> {
    let ciphered = fragment.len();
    let tag_len = epoch.auth.tag_len();
    let aead = epoch.cipher.is_aead_mode();
    let mut reserved: Option<TlsError> = None;
    let mut pos = 0;
    let mut count = ciphered;

    if !epoch.cipher.is_null_cipher() {
        match epoch
            .cipher
            .apply_explicit_nonce(&mut epoch.auth, content_type, fragment)
        {
            Ok(nonce_size) => {
                pos = nonce_size;
                let offset = if aead { nonce_size } else { 0 };
                match epoch
                    .cipher
                    .decrypt(&mut fragment[offset..], ciphered - offset, tag_len)
                {
                    Ok(n) => count = offset + n,
                    Err(TlsError::BadRecordMac) => reserved = Some(TlsError::BadRecordMac),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => {
                if aead {
                    // Rejected before the additional data was built.
                    epoch.auth.advance();
                }
                reserved = Some(e);
            }
        }
    }

    if tag_len != 0 {
        let (data, received) = if count >= pos + tag_len {
            let mac_offset = count - tag_len;
            (pos..mac_offset, mac_offset..count)
        } else {
            reserved.get_or_insert(TlsError::BadRecordMac);
            let mac_offset = ciphered.saturating_sub(tag_len);
            (0..mac_offset, mac_offset..ciphered)
        };
        let content_len = data.len();
        let mismatch = epoch.auth.check_mac_tags(
            content_type,
            &fragment[data.clone()],
            &fragment[received],
            false,
        )?;
        if mismatch {
            reserved.get_or_insert(TlsError::BadRecordMac);
        }
        if epoch.cipher.is_cbc_mode() {
            let remaining = epoch.auth.remainder_len(ciphered, content_len);
            epoch.auth.simulate_remainder(content_type, remaining)?;
        }
        count = data.end;
    } else if !aead {
        epoch.auth.advance();
    }

    match reserved {
        Some(e) => Err(e),
        None => Ok(pos..count),
    }
}
