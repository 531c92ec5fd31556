//! Inbound epoch tracking shared by the stream and engine front ends.

use tlsrec_types::{ProtocolVersion, TlsError};

use super::{ContentType, Epoch};
use crate::alert::Alert;
use crate::handshake::HandshakeType;

/// What a verified record means for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    ApplicationData,
    Handshake,
    /// A ChangeCipherSpec activated the staged read epoch.
    EpochChanged,
    Alert(Alert),
}

/// Read-direction epoch state: the active epoch, the one staged by the
/// handshake layer, and whether a Finished must come next.
#[derive(Debug)]
pub struct ReadState {
    pub epoch: Epoch,
    staged: Option<Epoch>,
    expecting_finished: bool,
}

impl ReadState {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            epoch: Epoch::null(version),
            staged: None,
            expecting_finished: false,
        }
    }

    /// Install the epoch the next ChangeCipherSpec switches to.
    pub fn stage(&mut self, next: Epoch) {
        self.staged = Some(next);
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    pub fn is_expecting_finished(&self) -> bool {
        self.expecting_finished
    }

    /// Classify a verified record, switching epochs on ChangeCipherSpec.
    pub fn accept(&mut self, content_type: ContentType, payload: &[u8]) -> Result<Disposition, TlsError> {
        if self.expecting_finished {
            if content_type != ContentType::Handshake
                || payload.first() != Some(&(HandshakeType::Finished as u8))
            {
                return Err(TlsError::UnexpectedMessage(format!(
                    "expected Finished after ChangeCipherSpec, got {content_type:?}"
                )));
            }
            self.expecting_finished = false;
        }
        match content_type {
            ContentType::ApplicationData => Ok(Disposition::ApplicationData),
            ContentType::Handshake => Ok(Disposition::Handshake),
            ContentType::Alert => Ok(Disposition::Alert(Alert::decode(payload)?)),
            ContentType::ChangeCipherSpec => {
                if payload != [1] {
                    return Err(TlsError::UnexpectedMessage("malformed ChangeCipherSpec".into()));
                }
                let next = self.staged.take().ok_or_else(|| {
                    TlsError::UnexpectedMessage("ChangeCipherSpec without pending keys".into())
                })?;
                self.epoch = next;
                self.expecting_finished = true;
                Ok(Disposition::EpochChanged)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertDescription, AlertLevel};

    #[test]
    fn test_ccs_activates_staged_epoch() {
        let mut state = ReadState::new(ProtocolVersion::TLS10);
        state.epoch.auth.advance();
        state.stage(Epoch::null(ProtocolVersion::TLS10));
        assert_eq!(
            state.accept(ContentType::ChangeCipherSpec, &[1]).unwrap(),
            Disposition::EpochChanged
        );
        assert_eq!(state.epoch.auth.sequence_number(), 0);
        assert!(state.is_expecting_finished());
        assert!(!state.has_staged());
    }

    #[test]
    fn test_finished_required_after_ccs() {
        let mut state = ReadState::new(ProtocolVersion::TLS10);
        state.stage(Epoch::null(ProtocolVersion::TLS10));
        state.accept(ContentType::ChangeCipherSpec, &[1]).unwrap();
        assert!(matches!(
            state.accept(ContentType::ApplicationData, b"early"),
            Err(TlsError::UnexpectedMessage(_))
        ));

        let mut state = ReadState::new(ProtocolVersion::TLS10);
        state.stage(Epoch::null(ProtocolVersion::TLS10));
        state.accept(ContentType::ChangeCipherSpec, &[1]).unwrap();
        assert_eq!(
            state.accept(ContentType::Handshake, &[20, 0, 0, 12]).unwrap(),
            Disposition::Handshake
        );
        assert!(!state.is_expecting_finished());
    }

    #[test]
    fn test_ccs_errors() {
        let mut state = ReadState::new(ProtocolVersion::TLS10);
        assert!(matches!(
            state.accept(ContentType::ChangeCipherSpec, &[1]),
            Err(TlsError::UnexpectedMessage(_))
        ));
        state.stage(Epoch::null(ProtocolVersion::TLS10));
        assert!(matches!(
            state.accept(ContentType::ChangeCipherSpec, &[1, 1]),
            Err(TlsError::UnexpectedMessage(_))
        ));
    }

    #[test]
    fn test_alert_disposition() {
        let mut state = ReadState::new(ProtocolVersion::TLS12);
        assert_eq!(
            state.accept(ContentType::Alert, &[2, 40]).unwrap(),
            Disposition::Alert(Alert::new(AlertLevel::Fatal, AlertDescription::HandshakeFailure))
        );
        assert!(state.accept(ContentType::Alert, &[2]).is_err());
    }
}
