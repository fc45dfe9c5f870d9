//! RTMP error types.
//!
//! The taxonomy separates fatal transport faults from recoverable protocol
//! conditions:
//!
//! - **Transport**: short reads/writes or a closed socket. Fatal; the
//!   connection attempt is aborted with no retry.
//! - **ProtocolViolation**: the peer drove a stream through an illegal state
//!   transition, targeted an unknown stream, or sent a malformed command.
//!   Reported once to the application error callback, after which the
//!   connection closes.
//! - **Mapping**: a command argument list did not match the expected shape.
//!   Carried as a nested [`MappingError`] so the command name and offending
//!   position survive into the error chain.
//!
//! A failed digest lookup during the handshake is *not* an error: it selects
//! simple mode, so it never appears here.

use thiserror::Error;

/// Errors produced by the RTMP session core.
#[derive(Error, Debug)]
pub enum RtmpError {
    /// Transport read/write failed or the connection closed mid-operation.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The handshake could not be completed.
    ///
    /// Wraps the underlying failure so callers can tell the handshake phase
    /// apart from the serving phase in the error chain.
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] Box<RtmpError>),

    /// The peer drove the protocol into an invalid state.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A stream with this id is already registered on the connection.
    #[error("stream {0} already exists")]
    StreamExists(u32),

    /// No stream with this id exists and the message cannot create one.
    #[error("stream {0} not found")]
    StreamNotFound(u32),

    /// Command argument mapping failed.
    ///
    /// Preserved via `#[from]` so the command name and argument position
    /// remain visible in the chain.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// The AMF encode/decode collaborator reported a failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Operation issued on a connection that is already closed.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias for RTMP operations.
pub type Result<T> = std::result::Result<T, RtmpError>;

/// Errors from converting between typed commands and wire argument lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Argument list is shorter than the command's layout requires.
    #[error("failed to map {command}: missing argument at position {position}")]
    MissingArgument {
        /// Wire name of the command being mapped.
        command: &'static str,
        /// Zero-based position of the absent argument.
        position: usize,
    },

    /// Wrong value type at a required position.
    #[error("failed to map {command}: args[{position}] is not a {expected}")]
    TypeMismatch {
        /// Wire name of the command being mapped.
        command: &'static str,
        /// Zero-based position of the offending argument.
        position: usize,
        /// Expected value type.
        expected: &'static str,
    },

    /// Command name outside the supported set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Receive-only command asked to serialize.
    #[error("command {0} cannot be encoded")]
    EncodeUnsupported(&'static str),
}
