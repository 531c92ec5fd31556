//! Outbound arbitration between sealed handshake-layer records and fresh
//! application data.
//!
//! Records written by the handshake layer (handshake, ChangeCipherSpec,
//! alerts) are sealed immediately and queued; each wrap call drains at
//! most one of them before any application data is written.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tlsrec_types::{ProtocolVersion, TlsError};

use super::args::EngineArgs;
use super::output::EngineOutputRecord;
use super::HandshakeStatus;
use crate::debug::DebugSink;
use crate::handshake::HandshakeType;
use crate::record::{protect, ContentType, Epoch};

/// An entry of the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundItem {
    /// A sealed record.
    Bytes(Vec<u8>),
    /// The preceding record carried our Finished message.
    HandshakeFinished,
}

/// Result of one [`EngineWriter::write_app_record`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// One queued record was moved to the network buffer, followed by this
    /// handshake status if any.
    Drained(Option<HandshakeStatus>),
    /// Application data (possibly none) was sealed.
    Wrote,
    /// The network buffer cannot hold the next record.
    Overflow,
}

#[derive(Debug, Default)]
struct WriterState {
    queue: VecDeque<OutboundItem>,
    outbound_closed: bool,
}

#[derive(Debug, Default)]
pub struct EngineWriter {
    state: Mutex<WriterState>,
    debug: DebugSink,
}

impl EngineWriter {
    pub fn new(debug: DebugSink) -> Self {
        Self {
            state: Mutex::new(WriterState::default()),
            debug,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seal a handshake-layer record and queue it. A handshake record
    /// starting with a Finished message is followed by the Finished marker.
    pub fn write_record(
        &self,
        content_type: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
        epoch: &mut Epoch,
    ) -> Result<(), TlsError> {
        let finished = content_type == ContentType::Handshake
            && payload.first() == Some(&(HandshakeType::Finished as u8));
        self.write_fragment(content_type, version, payload, epoch, finished)
    }

    /// Seal and queue one record; `finished` queues the Finished marker
    /// behind it.
    pub fn write_fragment(
        &self,
        content_type: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
        epoch: &mut Epoch,
        finished: bool,
    ) -> Result<(), TlsError> {
        let mut state = self.lock();
        if state.outbound_closed {
            return Err(TlsError::ConnectionClosed);
        }
        if epoch.auth.seq_num_overflow() {
            return Err(TlsError::SequenceOverflow);
        }
        self.debug.plaintext("Plaintext before ENCRYPTION", payload);
        let record = protect::seal_to_vec(epoch, content_type, version, payload)?;
        self.debug.record(format_args!(
            "WRITE: {version} {content_type:?}, length = {}",
            payload.len()
        ));
        state.queue.push_back(OutboundItem::Bytes(record));
        if finished {
            self.debug.handshake(format_args!("queued Finished"));
            state.queue.push_back(OutboundItem::HandshakeFinished);
        }
        Ok(())
    }

    /// Move one queued record into the network buffer, or, if nothing is
    /// queued, seal fresh application data from `args`.
    pub fn write_app_record(
        &self,
        args: &mut EngineArgs<'_>,
        epoch: &mut Epoch,
        output: &mut EngineOutputRecord,
    ) -> Result<WriteOutcome, TlsError> {
        let mut state = self.lock();
        if let Some(front) = state.queue.front() {
            if let OutboundItem::Bytes(bytes) = front {
                if bytes.len() > args.net.remaining() {
                    return Ok(WriteOutcome::Overflow);
                }
            }
            if let Some(OutboundItem::Bytes(bytes)) = state.queue.pop_front() {
                args.net.put(&bytes)?;
                self.debug.packet("Raw write", &bytes);
            }
            let status = match state.queue.front() {
                Some(OutboundItem::HandshakeFinished) => {
                    state.queue.pop_front();
                    Some(HandshakeStatus::Finished)
                }
                Some(OutboundItem::Bytes(_)) => Some(HandshakeStatus::NeedWrap),
                None => None,
            };
            return Ok(WriteOutcome::Drained(status));
        }
        if state.outbound_closed {
            return Err(TlsError::ConnectionClosed);
        }
        if args.app_remaining() > 0 && epoch.auth.seq_num_overflow() {
            return Err(TlsError::SequenceOverflow);
        }
        if output.required_space(args.app_remaining(), epoch) > args.net.remaining() {
            return Ok(WriteOutcome::Overflow);
        }
        output.write(args, epoch)?;
        Ok(WriteOutcome::Wrote)
    }

    /// No further records may be queued. Queued ones still drain.
    pub fn close_outbound(&self) {
        self.lock().outbound_closed = true;
    }

    pub fn is_outbound_closed(&self) -> bool {
        self.lock().outbound_closed
    }

    /// Closed and fully drained.
    pub fn is_outbound_done(&self) -> bool {
        let state = self.lock();
        state.outbound_closed && state.queue.is_empty()
    }

    pub fn has_outbound_data(&self) -> bool {
        !self.lock().queue.is_empty()
    }

    /// Size of the next queued record.
    pub fn pending_len(&self) -> Option<usize> {
        self.lock().queue.iter().find_map(|item| match item {
            OutboundItem::Bytes(b) => Some(b.len()),
            OutboundItem::HandshakeFinished => None,
        })
    }
}
