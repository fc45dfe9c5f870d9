//! Connection sessions, stream registry, and per-stream state machines.
//!
//! A connection session owns the transport, the registry of logical
//! streams multiplexed on it, and the negotiated handshake mode. The
//! control stream (id 0) is created first, carries the session-level
//! commands (`connect`, `createStream`), and survives until teardown.

mod connection;
mod registry;
mod stream;

pub use connection::{
    connect_client_session, serve_server_session, Connection, ConnectionState, Role,
    SessionHandler,
};
pub use registry::StreamRegistry;
pub use stream::{Stream, StreamState, StreamWriter};

/// Reserved id of the always-present control stream.
pub const CONTROL_STREAM_ID: u32 = 0;
