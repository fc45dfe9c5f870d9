//! # rtmp-core - RTMP Session Core
//!
//! Server and client side of an RTMP transport session: the fixed-size
//! digest handshake that authenticates the peer, and the per-connection
//! stream/session state machine that serves chunked command-and-media
//! messages over a single duplex byte stream.
//!
//! Chunk framing and AMF serialization are consumed behind traits
//! ([`FrameIo`], [`AmfCodec`]); media container parsing, congestion
//! control, and listener/process wiring are out of scope.
//!
//! ## Handshake
//!
//! ```text
//! Client                                Server
//!    |                                     |
//!    |-------- C0C1 (challenge) --------->|
//!    |                                     |  mode decided here
//!    |<----- S0S1S2 (response + ack) -----|
//!    |                                     |
//!    |-------- C2 (confirmation) -------->|
//!    |                                     |
//!    |            Handshake Done           |
//! ```
//!
//! Complex mode embeds an HMAC-SHA256 digest inside the 1528-byte filler
//! region of each challenge; a peer that presents a zero version field or
//! an unverifiable digest is served in simple mode instead. Mode is
//! decided once, during the first challenge/response exchange.
//!
//! ## Session
//!
//! After the handshake, the connection registers the control stream
//! (id 0) and enters the receive loop. Each complete framed message is
//! routed to its target stream; command bodies are decoded through the
//! AMF collaborator and mapped to typed [`Command`] values before they
//! reach the per-stream state machine and the application callbacks.
//!
//! | Connection state     | Transition                                  |
//! |----------------------|---------------------------------------------|
//! | `Created`            | construction around an open transport       |
//! | `Handshaking`        | four-packet exchange                        |
//! | `ControlStreamActive`| control stream registered                   |
//! | `Serving`            | receive loop until close or error           |
//! | `Closed`             | transport released exactly once             |
//!
//! ## Usage
//!
//! ### Server side
//!
//! ```rust,ignore
//! use rtmp::{serve_server_session, SessionHandler};
//!
//! // `framing` wraps the socket in your chunk codec; `amf` is your
//! // argument codec; `handler` receives commands and media.
//! serve_server_session(socket, framing, amf, handler).await?;
//! ```
//!
//! ### Client side
//!
//! ```rust,ignore
//! use rtmp::{connect_client_session, ClientHandshakeKind};
//!
//! // The digest flavor falls back to the simple exchange on its own when
//! // the server answers without a digest.
//! connect_client_session(socket, ClientHandshakeKind::Digest, framing, amf, handler).await?;
//! ```
//!
//! ## Concurrency model
//!
//! Each connection is served by exactly one logical sequence of steps; the
//! receive loop suspends only on the read of the next frame and the writes
//! of queued outbound messages. Connections are independent; the only
//! shared state is the immutable handshake key tables.
//!
//! ## Modules
//!
//! - [`handshake`]: digest engine and the four-packet exchange
//! - [`session`]: connection lifecycle, stream registry, state machines
//! - [`command`]: typed commands and the wire argument mapping
//! - [`codec`]: wire values and the collaborator seams
//! - [`error`]: error taxonomy and result alias

pub mod codec;
pub mod command;
pub mod error;
pub mod handshake;
pub mod session;

// Re-exports for convenience
pub use codec::{AmfCodec, EncodingType, Frame, FrameIo, Message, Value};
pub use command::{Command, StatusCode, StatusInfo, StatusLevel};
pub use error::{MappingError, Result, RtmpError};
pub use handshake::{
    handshake_client, handshake_server, ClientHandshake, ClientHandshakeKind,
    DigestHandshakeClient, HandshakeMode, HandshakeServer, SimpleHandshakeClient, Transport,
    RTMP_VERSION,
};
pub use session::{
    connect_client_session, serve_server_session, Connection, ConnectionState, Role,
    SessionHandler, Stream, StreamRegistry, StreamState, StreamWriter, CONTROL_STREAM_ID,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
