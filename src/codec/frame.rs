//! Framed messages exchanged with the chunk-framing collaborator.
//!
//! Chunk splitting and reassembly happen outside this crate: a [`FrameIo`]
//! implementation owns the transport after the handshake and yields one
//! complete message at a time, tagged with its target stream id and
//! timestamp.

use async_trait::async_trait;
use bytes::Bytes;

use super::EncodingType;
use crate::error::Result;

/// One complete framed message with its routing metadata.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Target logical stream.
    pub stream_id: u32,
    /// Message timestamp from the chunk header.
    pub timestamp: u32,
    /// Message payload.
    pub message: Message,
}

/// Message payload variants.
///
/// The set is closed, so dispatch matches exhaustively; an unknown message
/// kind cannot reach the session core.
#[derive(Debug, Clone)]
pub enum Message {
    /// Opaque audio payload.
    Audio(Bytes),
    /// Opaque video payload.
    Video(Bytes),
    /// Command message body: `[name, transaction id, args...]`.
    Command {
        /// Argument encoding of the body.
        encoding: EncodingType,
        /// Encoded body, decoded on dispatch via the connection's codec.
        payload: Bytes,
    },
    /// Data message body: `[name, args...]` (no transaction id).
    Data {
        /// Argument encoding of the body.
        encoding: EncodingType,
        /// Encoded body.
        payload: Bytes,
    },
}

impl Message {
    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Audio(_) => "audio",
            Message::Video(_) => "video",
            Message::Command { .. } => "command",
            Message::Data { .. } => "data",
        }
    }

    /// True for media payloads (audio or video).
    pub fn is_media(&self) -> bool {
        matches!(self, Message::Audio(_) | Message::Video(_))
    }
}

/// Chunk framing collaborator.
///
/// Implementations own the transport once the handshake hands it off. The
/// session core suspends only on these three operations.
#[async_trait]
pub trait FrameIo: Send {
    /// Read the next complete message. `None` means the transport closed in
    /// an orderly way; errors are reserved for transport faults.
    async fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Write one complete message.
    async fn write_frame(&mut self, frame: Frame) -> Result<()>;

    /// Release the underlying transport. Called exactly once per connection.
    async fn close(&mut self) -> Result<()>;
}
