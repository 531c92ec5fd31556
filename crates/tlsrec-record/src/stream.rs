//! Blocking record layer over a `Read + Write` transport.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use tlsrec_types::{ProtocolVersion, TlsError};

use crate::alert::{alert_for_error, Alert, AlertLevel};
use crate::config::RecordConfig;
use crate::debug::{DebugSink, TARGET_RECORD};
use crate::record::input::InputRecord;
use crate::record::output::{need_to_split_payload, OutputRecord};
use crate::record::state::{Disposition, ReadState};
use crate::record::{ContentType, Epoch, InboundRecord};

/// Record layer of one connection over a blocking transport.
#[derive(Debug)]
pub struct RecordStream<S> {
    transport: S,
    config: RecordConfig,
    debug: DebugSink,
    input: InputRecord,
    output: OutputRecord,
    read: ReadState,
    write_epoch: Epoch,
    first_app_record: bool,
    app_data: Vec<u8>,
    app_pos: usize,
    inbound: VecDeque<InboundRecord>,
    inbound_done: bool,
    peer_closed: bool,
    outbound_closed: bool,
}

impl<S: Read + Write> RecordStream<S> {
    pub fn new(transport: S, config: RecordConfig) -> Self {
        let debug = config.debug_sink();
        let version = config.max_version;
        Self {
            transport,
            input: InputRecord::new(&config, debug.clone()),
            output: OutputRecord::new(version, debug.clone()),
            read: ReadState::new(version),
            write_epoch: Epoch::null(version),
            first_app_record: true,
            app_data: Vec::new(),
            app_pos: 0,
            inbound: VecDeque::new(),
            inbound_done: false,
            peer_closed: false,
            outbound_closed: false,
            debug,
            config,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.transport
    }

    pub fn into_inner(self) -> S {
        self.transport
    }

    pub fn version(&self) -> ProtocolVersion {
        self.output.version()
    }

    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.output.set_version(version);
    }

    pub fn is_inbound_done(&self) -> bool {
        self.inbound_done
    }

    pub fn is_outbound_closed(&self) -> bool {
        self.outbound_closed
    }

    /// Install the epoch the peer's next ChangeCipherSpec activates.
    pub fn stage_read_epoch(&mut self, next: Epoch) {
        self.read.stage(next);
    }

    /// Either direction's sequence number is close to wrapping.
    pub fn sequence_is_huge(&self) -> bool {
        self.read.epoch.auth.seq_num_is_huge() || self.write_epoch.auth.seq_num_is_huge()
    }

    fn check_writable(&self) -> Result<(), TlsError> {
        if self.outbound_closed {
            return Err(TlsError::ConnectionClosed);
        }
        if self.write_epoch.auth.seq_num_overflow() {
            return Err(TlsError::SequenceOverflow);
        }
        Ok(())
    }

    /// Write a complete handshake message. With `hold` set, the records are
    /// kept back and go out with the next unheld write.
    pub fn write_handshake(&mut self, message: &[u8], hold: bool) -> Result<(), TlsError> {
        self.check_writable()?;
        let chunks: Vec<&[u8]> = message.chunks(self.config.max_fragment_size.max(1)).collect();
        let count = chunks.len();
        let result = chunks.into_iter().enumerate().try_for_each(|(i, chunk)| {
            self.output.write(
                &mut self.transport,
                ContentType::Handshake,
                chunk,
                &mut self.write_epoch,
                hold || i + 1 < count,
            )
        });
        result.map_err(|e| self.fail(e))
    }

    /// Write a ChangeCipherSpec under the current epoch, then switch to
    /// `next`.
    pub fn write_change_cipher_spec(&mut self, next: Epoch, hold: bool) -> Result<(), TlsError> {
        self.check_writable()?;
        if let Err(e) = self.output.write(
            &mut self.transport,
            ContentType::ChangeCipherSpec,
            &[1],
            &mut self.write_epoch,
            hold,
        ) {
            return Err(self.fail(e));
        }
        let mut old = std::mem::replace(&mut self.write_epoch, next);
        old.cipher.dispose();
        self.first_app_record = true;
        self.debug.record(format_args!("WRITE: ChangeCipherSpec, new write epoch"));
        Ok(())
    }

    /// Write all of `data` as application records, 1/n-1 split where the
    /// cipher calls for it.
    pub fn write_app(&mut self, data: &[u8]) -> Result<usize, TlsError> {
        self.check_writable()?;
        let max = self.config.max_fragment_size.max(1);
        let mut rest = data;
        while !rest.is_empty() {
            let split = need_to_split_payload(
                &self.write_epoch.cipher,
                self.first_app_record,
                self.config.cbc_record_splitting,
            );
            self.first_app_record = false;
            if split {
                let (one, tail) = rest.split_at(1);
                self.write_app_record(one, !tail.is_empty())?;
                rest = tail;
            }
            if rest.is_empty() {
                break;
            }
            let (chunk, tail) = rest.split_at(rest.len().min(max));
            self.write_app_record(chunk, false)?;
            rest = tail;
        }
        Ok(data.len())
    }

    fn write_app_record(&mut self, payload: &[u8], hold: bool) -> Result<(), TlsError> {
        let result = self.output.write(
            &mut self.transport,
            ContentType::ApplicationData,
            payload,
            &mut self.write_epoch,
            hold,
        );
        result.map_err(|e| self.fail(e))
    }

    /// Send an alert. A fatal alert closes both directions.
    pub fn send_alert(&mut self, alert: Alert) -> Result<(), TlsError> {
        if self.outbound_closed {
            return Err(TlsError::ConnectionClosed);
        }
        self.debug.record(format_args!(
            "WRITE: {:?} {:?}",
            alert.level, alert.description
        ));
        self.output.write(
            &mut self.transport,
            ContentType::Alert,
            &alert.encode(),
            &mut self.write_epoch,
            false,
        )?;
        if alert.level == AlertLevel::Fatal {
            self.outbound_closed = true;
            self.inbound_done = true;
        }
        Ok(())
    }

    /// Send close_notify (once) and refuse further writes.
    pub fn close(&mut self) -> Result<(), TlsError> {
        if self.outbound_closed {
            return Ok(());
        }
        let result = self.send_alert(Alert::close_notify());
        self.outbound_closed = true;
        result
    }

    /// Read records until one that is not application data arrives, and
    /// return it. Application data met on the way is buffered for
    /// [`RecordStream::read_app`]. `Ok(None)` once the inbound side is done.
    pub fn next_record(&mut self) -> Result<Option<InboundRecord>, TlsError> {
        if let Some(record) = self.inbound.pop_front() {
            return Ok(Some(record));
        }
        while !self.inbound_done {
            if let Some(record) = self.read_record()? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Copy buffered or newly received application data into `buf`.
    /// Returns 0 once the peer has closed.
    pub fn read_app(&mut self, buf: &mut [u8]) -> Result<usize, TlsError> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.app_pos == self.app_data.len() {
            if self.inbound_done {
                return Ok(0);
            }
            if let Some(record) = self.read_record()? {
                self.inbound.push_back(record);
            }
        }
        let n = buf.len().min(self.app_data.len() - self.app_pos);
        buf[..n].copy_from_slice(&self.app_data[self.app_pos..self.app_pos + n]);
        self.app_pos += n;
        if self.app_pos == self.app_data.len() {
            self.app_data.clear();
            self.app_pos = 0;
        }
        Ok(n)
    }

    /// Application bytes buffered and not yet read.
    pub fn buffered_app_len(&self) -> usize {
        self.app_data.len() - self.app_pos
    }

    /// Read one record. Application data goes to the buffer; anything the
    /// handshake layer must see is returned.
    fn read_record(&mut self) -> Result<Option<InboundRecord>, TlsError> {
        let record = match self.input.read(&mut self.transport, &mut self.read.epoch) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.inbound_done = true;
                if !self.peer_closed {
                    log::warn!(
                        target: TARGET_RECORD,
                        "{}, end of stream without close_notify",
                        self.debug.label()
                    );
                }
                return Ok(None);
            }
            Err(e) => return Err(self.fail(e)),
        };
        let disposition = match self.read.accept(record.content_type, &record.payload) {
            Ok(d) => d,
            Err(e) => return Err(self.fail(e)),
        };
        match disposition {
            Disposition::ApplicationData => {
                self.app_data.extend_from_slice(&record.payload);
                Ok(None)
            }
            Disposition::Handshake => Ok(Some(record)),
            Disposition::EpochChanged => {
                self.debug.record(format_args!("READ: ChangeCipherSpec, new read epoch"));
                Ok(Some(record))
            }
            Disposition::Alert(alert) => {
                self.debug.record(format_args!(
                    "READ: {:?} {:?}",
                    alert.level, alert.description
                ));
                if alert.is_close_notify() {
                    self.peer_closed = true;
                    self.inbound_done = true;
                    if let Err(e) = self.close() {
                        log::warn!(target: TARGET_RECORD, "{}, could not send close_notify: {e}", self.debug.label());
                    }
                    return Ok(None);
                }
                if alert.level == AlertLevel::Fatal {
                    return Err(self.fail(TlsError::AlertReceived(format!(
                        "{:?}",
                        alert.description
                    ))));
                }
                Ok(Some(record))
            }
        }
    }

    /// Fail the connection: send the matching fatal alert (best effort)
    /// and close both directions.
    fn fail(&mut self, err: TlsError) -> TlsError {
        if !err.is_fatal() {
            return err;
        }
        log::warn!(target: TARGET_RECORD, "{}, fatal: {err}", self.debug.label());
        let send = !matches!(
            err,
            TlsError::AlertReceived(_) | TlsError::ConnectionClosed | TlsError::IoError(_)
        );
        if send && !self.outbound_closed {
            let alert = Alert::fatal(alert_for_error(&err));
            if let Err(e) = self.send_alert(alert) {
                log::warn!(target: TARGET_RECORD, "{}, could not send {alert:?}: {e}", self.debug.label());
            }
        }
        self.outbound_closed = true;
        self.inbound_done = true;
        err
    }
}

fn to_io_error(err: TlsError) -> io::Error {
    match err {
        TlsError::IoError(e) => e,
        TlsError::ConnectionClosed => io::Error::new(io::ErrorKind::BrokenPipe, err),
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

impl<S: Read + Write> Read for RecordStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_app(buf).map_err(to_io_error)
    }
}

impl<S: Read + Write> Write for RecordStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_app(buf).map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush(&mut self.transport).map_err(to_io_error)
    }
}
