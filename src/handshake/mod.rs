//! RTMP handshake.
//!
//! Before any application data flows, both peers run a fixed four-packet
//! exchange that authenticates the other side and establishes a shared
//! timing baseline:
//!
//! ```text
//! Client                                Server
//!    |                                     |
//!    |-------- C0C1 (challenge) --------->|  version byte + 1536 payload
//!    |                                     |  mode decided here
//!    |<----- S0S1S2 (response + ack) -----|  one 3073-byte write
//!    |                                     |
//!    |-------- C2 (confirmation) -------->|
//!    |                                     |  content discarded
//!    |            Handshake Done           |
//! ```
//!
//! # Packet layout
//!
//! C1/S1 (1536 bytes, preceded by the 1-byte version on the wire):
//!
//! ```text
//! +----------------+----------------+--------------------------------+
//! | time (4 bytes) | zero/version   | filler (1528 bytes)            |
//! |                | tag (4 bytes)  | digest window in complex mode  |
//! +----------------+----------------+--------------------------------+
//! ```
//!
//! C2/S2 (1536 bytes): filler, with the reply digest in the trailing 32
//! bytes in complex mode, or a verbatim echo of the peer's payload in
//! simple mode.
//!
//! # Modes
//!
//! | Mode      | Selected when                                            |
//! |-----------|----------------------------------------------------------|
//! | `Complex` | version field nonzero *and* an embedded digest verifies  |
//! | `Simple`  | otherwise (zero version field or digest not found)       |
//!
//! The mode is decided once, during the first challenge/response exchange,
//! and never renegotiated. A digest that fails to verify is not an error;
//! it selects simple mode. Short reads and writes, by contrast, abort the
//! handshake: every packet has an exact length and partial transfers are
//! never retried piecemeal.

mod client;
mod digest;
mod server;

pub use client::{
    handshake_client, ClientHandshake, ClientHandshakeKind, DigestHandshakeClient,
    SimpleHandshakeClient,
};
pub use server::{handshake_server, HandshakeServer};

use tokio::io::{AsyncRead, AsyncWrite};

/// RTMP protocol version carried in C0/S0.
pub const RTMP_VERSION: u8 = 3;

/// Combined version byte + challenge payload (C0C1, S0S1).
pub(crate) const C0C1_LEN: usize = 1537;
/// Server response, same framing as the challenge.
pub(crate) const S0S1_LEN: usize = 1537;
/// Confirmation packet (C2).
pub(crate) const C2_LEN: usize = 1536;
/// Final acknowledgment (S2).
pub(crate) const S2_LEN: usize = 1536;
/// Combined server reply, written in one allocation.
pub(crate) const S0S1S2_LEN: usize = 3073;
/// Embedded digest window.
pub(crate) const DIGEST_LEN: usize = 32;
/// Filler region of a challenge payload.
pub(crate) const FILLER_LEN: usize = 1528;

/// ASCII prefix length of the client key; the prefix alone locates digests.
pub(crate) const CLIENT_PART_KEY_LEN: usize = 30;
/// ASCII prefix length of the server key.
pub(crate) const SERVER_PART_KEY_LEN: usize = 36;

/// Client key table: `"Genuine Adobe Flash Player 001"` + 32 key bytes.
///
/// These values are protocol constants; changing a single byte breaks
/// interoperability with deployed peers.
pub(crate) const CLIENT_KEY: [u8; 62] = [
    b'G', b'e', b'n', b'u', b'i', b'n', b'e', b' ', b'A', b'd', b'o', b'b', b'e', b' ', b'F', b'l',
    b'a', b's', b'h', b' ', b'P', b'l', b'a', b'y', b'e', b'r', b' ', b'0', b'0', b'1', 0xF0, 0xEE,
    0xC2, 0x4A, 0x80, 0x68, 0xBE, 0xE8, 0x2E, 0x00, 0xD0, 0xD1, 0x02, 0x9E, 0x7E, 0x57, 0x6E,
    0xEC, 0x5D, 0x2D, 0x29, 0x80, 0x6F, 0xAB, 0x93, 0xB8, 0xE6, 0x36, 0xCF, 0xEB, 0x31, 0xAE,
];

/// Server key table: `"Genuine Adobe Flash Media Server 001"` + 32 key bytes.
pub(crate) const SERVER_KEY: [u8; 68] = [
    b'G', b'e', b'n', b'u', b'i', b'n', b'e', b' ', b'A', b'd', b'o', b'b', b'e', b' ', b'F', b'l',
    b'a', b's', b'h', b' ', b'M', b'e', b'd', b'i', b'a', b' ', b'S', b'e', b'r', b'v', b'e', b'r',
    b' ', b'0', b'0', b'1', 0xF0, 0xEE, 0xC2, 0x4A, 0x80, 0x68, 0xBE, 0xE8, 0x2E, 0x00, 0xD0,
    0xD1, 0x02, 0x9E, 0x7E, 0x57, 0x6E, 0xEC, 0x5D, 0x2D, 0x29, 0x80, 0x6F, 0xAB, 0x93, 0xB8,
    0xE6, 0x36, 0xCF, 0xEB, 0x31, 0xAE,
];

/// Version tag sent by digest-mode clients (emulates Flash 9.0.124.2).
pub(crate) const CLIENT_VERSION: [u8; 4] = [9, 0, 124, 2];
/// Version tag sent by digest-mode servers.
pub(crate) const SERVER_VERSION: [u8; 4] = [0x0D, 0x0E, 0x0A, 0x0D];

/// Negotiated handshake variant.
///
/// Decided during the first challenge/response exchange and fixed for the
/// remainder of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMode {
    /// Plain timestamp/echo exchange, no digest verification.
    Simple,
    /// Digest-bearing exchange with verified embedded digests.
    Complex,
}

/// Byte-stream transport the handshake runs over.
///
/// Blanket-implemented for anything that can do async reads and writes;
/// the handshake needs nothing else from the transport.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

lazy_static::lazy_static! {
    /// Shared filler for the random regions of handshake packets.
    ///
    /// The content never participates in digest verification and is not key
    /// material; a fixed pattern keeps packets reproducible.
    static ref FILLER: [u8; FILLER_LEN] = {
        const PATTERN: &[u8] = b"rtmp-core handshake filler block ";
        let mut buf = [0u8; FILLER_LEN];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = PATTERN[i % PATTERN.len()];
        }
        buf
    };
}

/// Copy filler bytes into `out`, tiling the filler pattern so regions
/// longer than a single `FILLER` period are filled deterministically.
pub(crate) fn fill_filler(out: &mut [u8]) {
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = FILLER[i % FILLER_LEN];
    }
}

/// Millisecond wall-clock timestamp truncated to the 32-bit packet field.
pub(crate) fn now_timestamp() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tables_share_key_bytes() {
        // Both tables end in the same 32 key bytes; only the ASCII prefix
        // differs.
        assert_eq!(
            CLIENT_KEY[CLIENT_PART_KEY_LEN..],
            SERVER_KEY[SERVER_PART_KEY_LEN..]
        );
        assert_eq!(
            &CLIENT_KEY[..CLIENT_PART_KEY_LEN],
            b"Genuine Adobe Flash Player 001"
        );
        assert_eq!(
            &SERVER_KEY[..SERVER_PART_KEY_LEN],
            b"Genuine Adobe Flash Media Server 001"
        );
    }

    #[test]
    fn test_packet_lengths_are_consistent() {
        assert_eq!(C0C1_LEN, 1 + 8 + FILLER_LEN);
        assert_eq!(S0S1S2_LEN, S0S1_LEN + S2_LEN);
        assert_eq!(C2_LEN, S2_LEN);
    }

    #[test]
    fn test_filler_is_deterministic() {
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        fill_filler(&mut a);
        fill_filler(&mut b);
        assert_eq!(a, b);
    }
}
