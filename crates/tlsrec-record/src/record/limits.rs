//! Wire-format limits for SSLv3 / TLS 1.0-1.2 records.

/// Record header: type(1) || major(1) || minor(1) || length(2).
pub const HEADER_SIZE: usize = 5;

/// Maximum plaintext fragment (2^14).
pub const MAX_DATA_SIZE: usize = 16384;

/// Maximum CBC padding, including the length byte.
pub const MAX_PADDING: usize = 256;

/// Upper bound on an explicit IV or nonce.
pub const MAX_IV_LENGTH: usize = 256;

/// Largest MAC (HMAC-SHA384).
pub const MAX_MAC_SIZE: usize = 48;

/// Header plus the largest explicit IV.
pub const HEADER_PLUS_MAX_IV_SIZE: usize = HEADER_SIZE + MAX_IV_LENGTH;

/// Largest record a conforming peer sends.
pub const MAX_RECORD_SIZE: usize = HEADER_PLUS_MAX_IV_SIZE + MAX_DATA_SIZE + MAX_PADDING + MAX_MAC_SIZE;

/// Some deployed peers send records with up to 2^15 bytes of plaintext.
/// Accepted only when large records are enabled.
pub const MAX_LARGE_RECORD_SIZE: usize = MAX_RECORD_SIZE + MAX_DATA_SIZE;

/// Plaintext size that leaves room for a one-byte record split off the
/// front of a write.
pub const MAX_DATA_SIZE_MINUS_ONE_BYTE_RECORD: usize =
    MAX_DATA_SIZE - (HEADER_PLUS_MAX_IV_SIZE + 1 + MAX_PADDING + MAX_MAC_SIZE);

/// Largest alert record: two bytes of payload plus protection overhead.
pub const MAX_ALERT_RECORD_SIZE: usize = HEADER_PLUS_MAX_IV_SIZE + 2 + MAX_PADDING + MAX_MAC_SIZE;

/// Header length of a legacy SSLv2 record without padding.
pub const V2_SHORT_HEADER_SIZE: usize = 2;

/// Header length of a legacy SSLv2 record carrying a padding byte.
pub const V2_LONG_HEADER_SIZE: usize = 3;
