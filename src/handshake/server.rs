//! Server side of the handshake.
//!
//! Unlike the client, the server does not choose a flavor up front: it
//! inspects the client's challenge and mirrors whatever the client is able
//! to do. The whole reply (response + acknowledgment) is built in a single
//! 3073-byte allocation and written in one piece.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::digest::{digest_excluding_window, embed_digest, parse_challenge};
use super::{
    fill_filler, now_timestamp, HandshakeMode, Transport, C0C1_LEN, C2_LEN, CLIENT_KEY,
    CLIENT_PART_KEY_LEN, DIGEST_LEN, RTMP_VERSION, SERVER_KEY, SERVER_PART_KEY_LEN,
    SERVER_VERSION, S0S1S2_LEN, S2_LEN,
};
use crate::error::Result;

/// Server half of the four-packet exchange.
pub struct HandshakeServer {
    mode: HandshakeMode,
    reply: Box<[u8; S0S1S2_LEN]>,
}

impl HandshakeServer {
    /// Create a fresh server handshake.
    pub fn new() -> Self {
        Self {
            mode: HandshakeMode::Simple,
            reply: Box::new([0u8; S0S1S2_LEN]),
        }
    }

    /// Mode decided after the challenge has been read.
    pub fn mode(&self) -> HandshakeMode {
        self.mode
    }

    /// Read the client challenge (C0C1), decide the mode, and build the
    /// combined response + acknowledgment reply.
    pub async fn read_challenge(&mut self, transport: &mut dyn Transport) -> Result<()> {
        let mut challenge = [0u8; C0C1_LEN];
        transport.read_exact(&mut challenge).await?;

        let reply_key = parse_challenge(&challenge, &CLIENT_KEY[..CLIENT_PART_KEY_LEN], &SERVER_KEY);
        self.mode = if reply_key.is_some() {
            HandshakeMode::Complex
        } else {
            HandshakeMode::Simple
        };

        self.reply[0] = RTMP_VERSION;
        let (s1, s2) = self.reply[1..].split_at_mut(C2_LEN);

        s1[0..4].copy_from_slice(&now_timestamp().to_be_bytes());
        fill_filler(&mut s1[8..]);

        match reply_key {
            Some(key) => {
                s1[4..8].copy_from_slice(&SERVER_VERSION);
                embed_digest(s1, 8, &SERVER_KEY[..SERVER_PART_KEY_LEN]);

                // Acknowledgment: filler with the reply digest in the
                // trailing window, keyed by the digest located in the
                // client's challenge.
                fill_filler(s2);
                let window = S2_LEN - DIGEST_LEN;
                let digest = digest_excluding_window(s2, window, &key);
                s2[window..].copy_from_slice(&digest);
            }
            None => {
                s1[4..8].copy_from_slice(&[0; 4]);
                // Echo the client's payload back as the acknowledgment.
                s2.copy_from_slice(&challenge[1..]);
            }
        }
        Ok(())
    }

    /// Send the combined response + acknowledgment (S0S1S2).
    pub async fn write_response(&mut self, transport: &mut dyn Transport) -> Result<()> {
        transport.write_all(&self.reply[..]).await?;
        Ok(())
    }

    /// Read and discard the client's confirmation (C2).
    pub async fn read_confirmation(&mut self, transport: &mut dyn Transport) -> Result<()> {
        let mut confirmation = [0u8; C2_LEN];
        transport.read_exact(&mut confirmation).await?;
        Ok(())
    }

    /// Run the full server handshake over `transport`.
    pub async fn handshake(&mut self, transport: &mut dyn Transport) -> Result<HandshakeMode> {
        self.read_challenge(transport).await?;
        self.write_response(transport).await?;
        self.read_confirmation(transport).await?;
        tracing::debug!(mode = ?self.mode, "server handshake done");
        Ok(self.mode)
    }
}

impl Default for HandshakeServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full server handshake over `transport`.
pub async fn handshake_server(transport: &mut dyn Transport) -> Result<HandshakeMode> {
    HandshakeServer::new().handshake(transport).await
}
