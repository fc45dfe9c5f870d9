//! Per-stream state machines and the outbound send path.

use tokio::sync::mpsc;

use crate::codec::{EncodingType, Message};
use crate::command::{Command, StatusInfo};
use crate::error::{Result, RtmpError};

/// Per-stream lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Control stream before the connect round-trip completes.
    NotConnected,
    /// Control stream after a successful `connect`.
    Connected,
    /// Data stream allocated via `createStream`, no role yet.
    Created,
    /// Receiving a publish feed.
    Publishing,
    /// Serving playback.
    Playing,
    /// Ended by `closeStream` or connection teardown.
    Closed,
}

impl StreamState {
    fn can_move_to(self, next: StreamState) -> bool {
        matches!(
            (self, next),
            (StreamState::NotConnected, StreamState::Connected)
                | (StreamState::Created, StreamState::Publishing)
                | (StreamState::Created, StreamState::Playing)
                | (StreamState::Created, StreamState::Closed)
                | (StreamState::Publishing, StreamState::Closed)
                | (StreamState::Playing, StreamState::Closed)
        )
    }
}

/// Items a stream queues for the connection to encode and write.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Pre-encoded message.
    Message {
        stream_id: u32,
        timestamp: u32,
        message: Message,
    },
    /// Typed command, encoded by the connection at write time.
    Command {
        stream_id: u32,
        timestamp: u32,
        transaction_id: f64,
        encoding: EncodingType,
        command: Command,
    },
}

/// Narrow send capability tagged with one stream's id.
///
/// Lets a stream (or the application holding its writer) queue outbound
/// messages without a back-reference into the connection; the connection
/// drains the queue and performs the actual writes.
#[derive(Debug, Clone)]
pub struct StreamWriter {
    stream_id: u32,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl StreamWriter {
    pub(crate) fn new(stream_id: u32, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { stream_id, tx }
    }

    /// Id of the stream this writer is bound to.
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    /// Queue a message for this stream.
    pub fn send_message(&self, timestamp: u32, message: Message) -> Result<()> {
        self.tx
            .send(Outbound::Message {
                stream_id: self.stream_id,
                timestamp,
                message,
            })
            .map_err(|_| RtmpError::ConnectionClosed)
    }

    /// Queue a typed command for this stream.
    pub fn send_command(
        &self,
        transaction_id: f64,
        encoding: EncodingType,
        command: Command,
    ) -> Result<()> {
        self.tx
            .send(Outbound::Command {
                stream_id: self.stream_id,
                timestamp: 0,
                transaction_id,
                encoding,
                command,
            })
            .map_err(|_| RtmpError::ConnectionClosed)
    }

    /// Queue an `onStatus` notification for this stream.
    pub fn send_status(&self, info: StatusInfo) -> Result<()> {
        self.send_command(0.0, EncodingType::default(), Command::OnStatus(info))
    }
}

/// One logical stream multiplexed on a connection.
#[derive(Debug)]
pub struct Stream {
    id: u32,
    state: StreamState,
    writer: StreamWriter,
}

impl Stream {
    pub(crate) fn new(id: u32, state: StreamState, tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id,
            state,
            writer: StreamWriter::new(id, tx),
        }
    }

    /// Stream id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Send capability for this stream.
    pub fn writer(&self) -> &StreamWriter {
        &self.writer
    }

    /// Apply a transition requested by a peer command, rejecting illegal
    /// moves as protocol violations.
    pub(crate) fn transition(&mut self, next: StreamState) -> Result<()> {
        if !self.state.can_move_to(next) {
            return Err(RtmpError::ProtocolViolation(format!(
                "stream {}: cannot move from {:?} to {:?}",
                self.id, self.state, next
            )));
        }
        tracing::debug!(stream_id = self.id, from = ?self.state, to = ?next, "stream state change");
        self.state = next;
        Ok(())
    }
}
