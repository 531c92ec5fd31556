//! TLS alert protocol.

use tlsrec_types::TlsError;

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

/// Alert description codes (SSLv3 and TLS 1.0-1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    /// Deprecated in TLS 1.2 (RFC 5246); replaced by BadRecordMac.
    DecryptionFailed = 21,
    RecordOverflow = 22,
    DecompressionFailure = 30,
    HandshakeFailure = 40,
    /// SSLv3 only.
    NoCertificate = 41,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    /// Export cipher suites, TLS 1.0 only.
    ExportRestriction = 60,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    InappropriateFallback = 86,
    UserCanceled = 90,
    NoRenegotiation = 100,
    UnsupportedExtension = 110,
    UnrecognizedName = 112,
}

/// A TLS alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl AlertLevel {
    /// Convert from u8 to AlertLevel.
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(AlertLevel::Warning),
            2 => Ok(AlertLevel::Fatal),
            _ => Err(v),
        }
    }
}

impl AlertDescription {
    /// Convert from u8 to AlertDescription.
    pub fn from_u8(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(AlertDescription::CloseNotify),
            10 => Ok(AlertDescription::UnexpectedMessage),
            20 => Ok(AlertDescription::BadRecordMac),
            21 => Ok(AlertDescription::DecryptionFailed),
            22 => Ok(AlertDescription::RecordOverflow),
            30 => Ok(AlertDescription::DecompressionFailure),
            40 => Ok(AlertDescription::HandshakeFailure),
            41 => Ok(AlertDescription::NoCertificate),
            42 => Ok(AlertDescription::BadCertificate),
            43 => Ok(AlertDescription::UnsupportedCertificate),
            44 => Ok(AlertDescription::CertificateRevoked),
            45 => Ok(AlertDescription::CertificateExpired),
            46 => Ok(AlertDescription::CertificateUnknown),
            47 => Ok(AlertDescription::IllegalParameter),
            48 => Ok(AlertDescription::UnknownCa),
            49 => Ok(AlertDescription::AccessDenied),
            50 => Ok(AlertDescription::DecodeError),
            51 => Ok(AlertDescription::DecryptError),
            60 => Ok(AlertDescription::ExportRestriction),
            70 => Ok(AlertDescription::ProtocolVersion),
            71 => Ok(AlertDescription::InsufficientSecurity),
            80 => Ok(AlertDescription::InternalError),
            86 => Ok(AlertDescription::InappropriateFallback),
            90 => Ok(AlertDescription::UserCanceled),
            100 => Ok(AlertDescription::NoRenegotiation),
            110 => Ok(AlertDescription::UnsupportedExtension),
            112 => Ok(AlertDescription::UnrecognizedName),
            _ => Err(v),
        }
    }
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    pub fn fatal(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Fatal, description)
    }

    pub fn close_notify() -> Self {
        Self::new(AlertLevel::Warning, AlertDescription::CloseNotify)
    }

    pub fn encode(&self) -> [u8; 2] {
        [self.level as u8, self.description as u8]
    }

    /// Parse an alert record payload.
    pub fn decode(payload: &[u8]) -> Result<Self, TlsError> {
        if payload.len() != 2 {
            return Err(TlsError::UnexpectedMessage(format!(
                "alert record of {} bytes",
                payload.len()
            )));
        }
        let level = AlertLevel::from_u8(payload[0])
            .map_err(|v| TlsError::UnexpectedMessage(format!("unknown alert level {v}")))?;
        let description = AlertDescription::from_u8(payload[1])
            .map_err(|v| TlsError::UnexpectedMessage(format!("unknown alert description {v}")))?;
        Ok(Self { level, description })
    }

    pub fn is_close_notify(&self) -> bool {
        self.description == AlertDescription::CloseNotify
    }
}

/// The alert sent to the peer when the record layer fails with `err`.
pub fn alert_for_error(err: &TlsError) -> AlertDescription {
    match err {
        TlsError::BadRecordMac => AlertDescription::BadRecordMac,
        TlsError::RecordOverflow(_) => AlertDescription::RecordOverflow,
        TlsError::UnsupportedRecordVersion { .. } => AlertDescription::ProtocolVersion,
        TlsError::RecordError(_)
        | TlsError::UnrecognizedMessage
        | TlsError::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
        TlsError::HandshakeFailed(_) => AlertDescription::HandshakeFailure,
        TlsError::AlertReceived(_) | TlsError::ConnectionClosed => AlertDescription::CloseNotify,
        _ => AlertDescription::InternalError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_level_values() {
        assert_eq!(AlertLevel::Warning as u8, 1);
        assert_eq!(AlertLevel::Fatal as u8, 2);
    }

    #[test]
    fn test_alert_level_from_u8() {
        assert_eq!(AlertLevel::from_u8(1).unwrap(), AlertLevel::Warning);
        assert_eq!(AlertLevel::from_u8(2).unwrap(), AlertLevel::Fatal);
        assert_eq!(AlertLevel::from_u8(0).unwrap_err(), 0);
        assert_eq!(AlertLevel::from_u8(255).unwrap_err(), 255);
    }

    #[test]
    fn test_alert_description_from_u8_roundtrip() {
        let codes: &[u8] = &[
            0, 10, 20, 21, 22, 30, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 60, 70, 71, 80,
            86, 90, 100, 110, 112,
        ];
        for &code in codes {
            let desc = AlertDescription::from_u8(code).unwrap();
            assert_eq!(desc as u8, code);
        }
        assert!(AlertDescription::from_u8(1).is_err());
        assert!(AlertDescription::from_u8(116).is_err());
    }

    #[test]
    fn test_alert_encode_decode() {
        let alert = Alert::fatal(AlertDescription::BadRecordMac);
        assert_eq!(alert.encode(), [2, 20]);
        assert_eq!(Alert::decode(&[2, 20]).unwrap(), alert);
        assert!(Alert::decode(&[1, 0]).unwrap().is_close_notify());
        assert!(Alert::decode(&[1]).is_err());
        assert!(Alert::decode(&[1, 0, 0]).is_err());
        assert!(Alert::decode(&[3, 0]).is_err());
    }

    #[test]
    fn test_alert_for_error() {
        assert_eq!(alert_for_error(&TlsError::BadRecordMac), AlertDescription::BadRecordMac);
        assert_eq!(
            alert_for_error(&TlsError::RecordOverflow("x".into())),
            AlertDescription::RecordOverflow
        );
        assert_eq!(
            alert_for_error(&TlsError::UnsupportedRecordVersion { major: 4, minor: 0 }),
            AlertDescription::ProtocolVersion
        );
        assert_eq!(
            alert_for_error(&TlsError::UnrecognizedMessage),
            AlertDescription::UnexpectedMessage
        );
        assert_eq!(
            alert_for_error(&TlsError::HandshakeFailed("x".into())),
            AlertDescription::HandshakeFailure
        );
        assert_eq!(
            alert_for_error(&TlsError::SequenceOverflow),
            AlertDescription::InternalError
        );
    }
}
