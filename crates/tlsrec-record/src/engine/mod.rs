//! Non-blocking record engine over caller-owned buffers.
//!
//! [`RecordEngine::wrap`] moves at most one record (a queued handshake-layer
//! record, or fresh application data) into the network buffer;
//! [`RecordEngine::unwrap`] consumes at most one record from it. Neither
//! call blocks: every outcome is reported through an [`EngineResult`].

pub mod args;
pub mod buffer;
pub mod input;
pub mod output;
pub mod writer;

use std::collections::VecDeque;
use std::fmt;

use tlsrec_types::{ProtocolVersion, TlsError};

use crate::alert::{alert_for_error, Alert, AlertLevel};
use crate::config::RecordConfig;
use crate::debug::{DebugSink, TARGET_RECORD};
use crate::handshake::HandshakeType;
use crate::record::framing::RecordCodec;
use crate::record::limits::HEADER_SIZE;
use crate::record::state::{Disposition, ReadState};
use crate::record::{ContentType, Epoch, InboundRecord};
use args::EngineArgs;
use buffer::Buffer;
use input::{EngineInbound, EngineInputRecord};
use output::EngineOutputRecord;
use writer::{EngineWriter, WriteOutcome};

/// Outcome of one wrap or unwrap call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not enough network bytes for a whole record.
    BufferUnderflow,
    /// The destination cannot hold the next record.
    BufferOverflow,
    Ok,
    /// This direction is closed.
    Closed,
}

/// What the handshake layer should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    NotHandshaking,
    /// Our Finished message has just been written out.
    Finished,
    /// Queued records are waiting for wrap.
    NeedWrap,
    /// The handshake is waiting for peer records.
    NeedUnwrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineResult {
    pub status: Status,
    pub handshake_status: HandshakeStatus,
    pub bytes_consumed: usize,
    pub bytes_produced: usize,
}

impl fmt::Display for EngineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status = {:?} HandshakeStatus = {:?} bytesConsumed = {} bytesProduced = {}",
            self.status, self.handshake_status, self.bytes_consumed, self.bytes_produced
        )
    }
}

/// Record layer of one connection, driven by caller buffers.
#[derive(Debug)]
pub struct RecordEngine {
    config: RecordConfig,
    debug: DebugSink,
    input: EngineInputRecord,
    output: EngineOutputRecord,
    writer: EngineWriter,
    read: ReadState,
    write_epoch: Epoch,
    inbound: VecDeque<InboundRecord>,
    inbound_done: bool,
    peer_closed: bool,
    handshaking: bool,
}

impl RecordEngine {
    pub fn new(config: RecordConfig) -> Self {
        let debug = config.debug_sink();
        let version = config.max_version;
        Self {
            input: EngineInputRecord::new(&config, debug.clone()),
            output: EngineOutputRecord::new(
                version,
                config.max_fragment_size,
                config.cbc_record_splitting,
                debug.clone(),
            ),
            writer: EngineWriter::new(debug.clone()),
            read: ReadState::new(version),
            write_epoch: Epoch::null(version),
            inbound: VecDeque::new(),
            inbound_done: false,
            peer_closed: false,
            handshaking: false,
            debug,
            config,
        }
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Version stamped on outbound record headers.
    pub fn version(&self) -> ProtocolVersion {
        self.output.version()
    }

    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.output.set_version(version);
    }

    pub fn set_handshaking(&mut self, handshaking: bool) {
        self.handshaking = handshaking;
    }

    pub fn handshake_status(&self) -> HandshakeStatus {
        if self.writer.has_outbound_data() {
            HandshakeStatus::NeedWrap
        } else if self.handshaking {
            HandshakeStatus::NeedUnwrap
        } else {
            HandshakeStatus::NotHandshaking
        }
    }

    /// Seal application data from `apps[offset..offset + len]` into `net`,
    /// or drain one queued record.
    pub fn wrap(
        &mut self,
        apps: &mut [Buffer],
        offset: usize,
        len: usize,
        net: &mut Buffer,
    ) -> Result<EngineResult, TlsError> {
        let mut args = EngineArgs::for_wrap(apps, offset, len, net)?;
        if self.writer.is_outbound_done() {
            return Ok(self.result(Status::Closed, None, 0, 0));
        }
        let outcome = args.guarded(|args| {
            self.writer
                .write_app_record(args, &mut self.write_epoch, &mut self.output)
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };
        let (status, handshake_status) = match outcome {
            WriteOutcome::Drained(hs) => (Status::Ok, hs),
            WriteOutcome::Wrote => (Status::Ok, None),
            WriteOutcome::Overflow => (Status::BufferOverflow, None),
        };
        let status = if status == Status::Ok && self.writer.is_outbound_done() {
            Status::Closed
        } else {
            status
        };
        Ok(self.result(status, handshake_status, args.delta_app(), args.delta_net()))
    }

    /// Read one record from `net`. Application data is scattered into
    /// `apps[offset..offset + len]`; other records are queued for
    /// [`RecordEngine::take_inbound_record`].
    pub fn unwrap(
        &mut self,
        net: &mut Buffer,
        apps: &mut [Buffer],
        offset: usize,
        len: usize,
    ) -> Result<EngineResult, TlsError> {
        let mut args = EngineArgs::for_unwrap(net, apps, offset, len)?;
        if self.inbound_done {
            return Ok(self.result(Status::Closed, None, 0, 0));
        }
        let packet_len = match self.input.packet_len(args.net()) {
            Ok(Some(n)) if n <= args.net().remaining() => n,
            Ok(_) => return Ok(self.result(Status::BufferUnderflow, None, 0, 0)),
            Err(e) => return Err(self.fail(e)),
        };
        if self.input.is_format_verified()
            && args.net().as_slice()[0] == ContentType::ApplicationData as u8
            && args.app_remaining() < self.app_data_bound(packet_len)
        {
            return Ok(self.result(Status::BufferOverflow, None, 0, 0));
        }
        let status = args.guarded(|args| self.read_one(args, packet_len));
        match status {
            Ok(status) => Ok(self.result(status, None, args.delta_net(), args.delta_app())),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Largest plaintext a packet of `packet_len` bytes can carry under the
    /// current read epoch.
    fn app_data_bound(&self, packet_len: usize) -> usize {
        let epoch = &self.read.epoch;
        let tag = if epoch.cipher.is_aead_mode() {
            epoch.cipher.tag_size()
        } else {
            epoch.auth.tag_len()
        };
        packet_len.saturating_sub(HEADER_SIZE + epoch.cipher.explicit_nonce_size() + tag)
    }

    fn read_one(&mut self, args: &mut EngineArgs<'_>, packet_len: usize) -> Result<Status, TlsError> {
        match self.input.read(&mut *args.net, packet_len, &mut self.read.epoch)? {
            EngineInbound::AppData(range) => {
                self.read
                    .accept(ContentType::ApplicationData, &args.net().storage()[range.clone()])?;
                args.scatter_net_range(range)?;
                Ok(Status::Ok)
            }
            EngineInbound::Record(record) => self.handle_record(args, record),
        }
    }

    fn handle_record(&mut self, args: &mut EngineArgs<'_>, record: InboundRecord) -> Result<Status, TlsError> {
        match self.read.accept(record.content_type, &record.payload)? {
            Disposition::ApplicationData => {
                args.scatter(&record.payload)?;
                Ok(Status::Ok)
            }
            Disposition::EpochChanged => {
                self.debug.record(format_args!("READ: ChangeCipherSpec, new read epoch"));
                self.inbound.push_back(record);
                Ok(Status::Ok)
            }
            Disposition::Handshake => {
                self.inbound.push_back(record);
                Ok(Status::Ok)
            }
            Disposition::Alert(alert) => {
                self.debug.record(format_args!(
                    "READ: {:?} {:?}",
                    alert.level, alert.description
                ));
                if alert.is_close_notify() {
                    self.peer_closed = true;
                    self.inbound_done = true;
                    self.close_outbound();
                    return Ok(Status::Closed);
                }
                if alert.level == AlertLevel::Fatal {
                    return Err(TlsError::AlertReceived(format!("{:?}", alert.description)));
                }
                self.inbound.push_back(record);
                Ok(Status::Ok)
            }
        }
    }

    fn result(
        &self,
        status: Status,
        handshake_status: Option<HandshakeStatus>,
        bytes_consumed: usize,
        bytes_produced: usize,
    ) -> EngineResult {
        EngineResult {
            status,
            handshake_status: handshake_status.unwrap_or_else(|| self.handshake_status()),
            bytes_consumed,
            bytes_produced,
        }
    }

    /// Fail the connection on a fatal error: queue the matching alert (best
    /// effort) and close both directions.
    fn fail(&mut self, err: TlsError) -> TlsError {
        if !err.is_fatal() {
            return err;
        }
        log::warn!(target: TARGET_RECORD, "{}, fatal: {err}", self.debug.label());
        if !matches!(err, TlsError::AlertReceived(_) | TlsError::ConnectionClosed)
            && !self.writer.is_outbound_closed()
        {
            let alert = Alert::fatal(alert_for_error(&err));
            if let Err(e) = self.queue_alert(alert) {
                log::warn!(target: TARGET_RECORD, "{}, could not send {alert:?}: {e}", self.debug.label());
            }
        }
        self.writer.close_outbound();
        self.inbound_done = true;
        err
    }

    fn queue_alert(&mut self, alert: Alert) -> Result<(), TlsError> {
        self.debug.record(format_args!(
            "WRITE: {:?} {:?}",
            alert.level, alert.description
        ));
        self.writer.write_record(
            ContentType::Alert,
            self.output.version(),
            &alert.encode(),
            &mut self.write_epoch,
        )
    }

    /// Queue a complete handshake message, fragmented to the configured
    /// maximum fragment size.
    pub fn write_handshake(&mut self, message: &[u8]) -> Result<(), TlsError> {
        if message.is_empty() {
            return Err(TlsError::Internal("empty handshake message".into()));
        }
        let finished = message[0] == HandshakeType::Finished as u8;
        let chunks: Vec<&[u8]> = message.chunks(self.config.max_fragment_size.max(1)).collect();
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            self.writer.write_fragment(
                ContentType::Handshake,
                self.output.version(),
                chunk,
                &mut self.write_epoch,
                finished && i == last,
            )?;
        }
        Ok(())
    }

    /// Queue a ChangeCipherSpec under the current write epoch, then switch
    /// to `next`.
    pub fn write_change_cipher_spec(&mut self, next: Epoch) -> Result<(), TlsError> {
        self.writer.write_record(
            ContentType::ChangeCipherSpec,
            self.output.version(),
            &[1],
            &mut self.write_epoch,
        )?;
        let mut old = std::mem::replace(&mut self.write_epoch, next);
        old.cipher.dispose();
        self.output.reset_epoch();
        self.debug.record(format_args!("WRITE: ChangeCipherSpec, new write epoch"));
        Ok(())
    }

    /// Install the epoch the peer's next ChangeCipherSpec activates.
    pub fn stage_read_epoch(&mut self, next: Epoch) {
        self.read.stage(next);
    }

    /// Queue an alert. A fatal alert closes both directions.
    pub fn send_alert(&mut self, alert: Alert) -> Result<(), TlsError> {
        self.queue_alert(alert)?;
        if alert.level == AlertLevel::Fatal {
            self.writer.close_outbound();
            self.inbound_done = true;
        }
        Ok(())
    }

    /// Queue close_notify (once) and refuse further outbound records.
    pub fn close_outbound(&mut self) {
        if self.writer.is_outbound_closed() {
            return;
        }
        if let Err(e) = self.queue_alert(Alert::close_notify()) {
            log::warn!(target: TARGET_RECORD, "{}, could not send close_notify: {e}", self.debug.label());
        }
        self.writer.close_outbound();
    }

    /// Stop reading. Closing before the peer's close_notify arrived is
    /// reported as a possible truncation attack.
    pub fn close_inbound(&mut self) -> Result<(), TlsError> {
        if self.inbound_done {
            return Ok(());
        }
        self.inbound_done = true;
        if self.peer_closed {
            return Ok(());
        }
        Err(self.fail(TlsError::Internal(
            "inbound closed before receiving peer's close_notify".into(),
        )))
    }

    pub fn is_inbound_done(&self) -> bool {
        self.inbound_done
    }

    pub fn is_outbound_done(&self) -> bool {
        self.writer.is_outbound_done()
    }

    pub fn has_outbound_data(&self) -> bool {
        self.writer.has_outbound_data()
    }

    /// Next non-application record received, oldest first.
    pub fn take_inbound_record(&mut self) -> Option<InboundRecord> {
        self.inbound.pop_front()
    }

    /// Either direction's sequence number is close to wrapping.
    pub fn sequence_is_huge(&self) -> bool {
        self.read.epoch.auth.seq_num_is_huge() || self.write_epoch.auth.seq_num_is_huge()
    }
}
