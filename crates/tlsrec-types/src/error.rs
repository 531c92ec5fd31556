/// Errors reported by the cryptographic provider.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid argument")]
    InvalidArg,
    #[error("operation not supported")]
    NotSupported,
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("input is not a multiple of the block size")]
    NotBlockAligned,
    #[error("buffer length not enough: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },
    #[error("aead: tag verification failed")]
    AeadTagVerifyFail,
    #[error("cipher finalization failed")]
    FinalizeFailed,
}

/// Record layer errors.
///
/// Padding and MAC failures share the single `BadRecordMac` kind so that a
/// peer cannot tell which check rejected a record.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("record layer error: {0}")]
    RecordError(String),
    #[error("unsupported record version {major}.{minor}")]
    UnsupportedRecordVersion { major: u8, minor: u8 },
    #[error("unrecognized SSL message, plaintext connection?")]
    UnrecognizedMessage,
    #[error("record overflow: {0}")]
    RecordOverflow(String),
    #[error("bad record MAC")]
    BadRecordMac,
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("alert received: {0}")]
    AlertReceived(String),
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),
    #[error("read-only buffer")]
    ReadOnlyBuffer,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("sequence number overflow")]
    SequenceOverflow,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

impl TlsError {
    /// True for errors that terminate the connection.
    ///
    /// Only buffer-contract violations leave the connection usable: they are
    /// rejected before any state is touched.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TlsError::InvalidBuffer(_) | TlsError::ReadOnlyBuffer)
    }
}
