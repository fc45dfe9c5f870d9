//! Client side of the handshake.
//!
//! Two implementations of one capability interface, selected when the
//! connection is established: [`SimpleHandshakeClient`] never embeds a
//! digest, [`DigestHandshakeClient`] embeds one and falls back to the
//! simple exchange when the server's response carries no verifiable digest.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::digest::{digest_excluding_window, embed_digest, parse_challenge};
use super::{
    fill_filler, now_timestamp, HandshakeMode, Transport, C0C1_LEN, C2_LEN, CLIENT_KEY,
    CLIENT_PART_KEY_LEN, CLIENT_VERSION, DIGEST_LEN, RTMP_VERSION, SERVER_KEY,
    SERVER_PART_KEY_LEN, S2_LEN,
};
use crate::error::Result;

/// Client half of the four-packet exchange.
///
/// Implementations are stateful: the confirmation packet is prepared while
/// reading the response, so the four operations must run in order.
#[async_trait]
pub trait ClientHandshake: Send {
    /// Build and send the challenge (C0C1).
    async fn write_challenge(&mut self, transport: &mut dyn Transport) -> Result<()>;

    /// Read the server response (S0S1) and prepare the confirmation.
    async fn read_response(&mut self, transport: &mut dyn Transport) -> Result<()>;

    /// Send the confirmation (C2).
    async fn write_confirmation(&mut self, transport: &mut dyn Transport) -> Result<()>;

    /// Read the final acknowledgment (S2). Its content is discarded; only
    /// that it arrives intact matters.
    async fn read_acknowledgment(&mut self, transport: &mut dyn Transport) -> Result<()>;

    /// Mode in effect once the response has been read.
    fn mode(&self) -> HandshakeMode;
}

/// Selects the client handshake flavor at connection establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientHandshakeKind {
    /// Plain timestamp/echo exchange.
    Simple,
    /// Digest-bearing exchange, falling back to simple on mismatch.
    #[default]
    Digest,
}

impl ClientHandshakeKind {
    /// Build the handshake implementation for this flavor.
    pub fn strategy(self) -> Box<dyn ClientHandshake> {
        match self {
            Self::Simple => Box::new(SimpleHandshakeClient::new()),
            Self::Digest => Box::new(DigestHandshakeClient::new()),
        }
    }
}

/// Run the full client handshake over `transport`.
///
/// Any transport failure aborts the attempt; there is no retry.
pub async fn handshake_client(
    transport: &mut dyn Transport,
    strategy: &mut dyn ClientHandshake,
) -> Result<HandshakeMode> {
    strategy.write_challenge(transport).await?;
    strategy.read_response(transport).await?;
    strategy.write_confirmation(transport).await?;
    strategy.read_acknowledgment(transport).await?;
    tracing::debug!(mode = ?strategy.mode(), "client handshake done");
    Ok(strategy.mode())
}

/// Client handshake with no digest: a timestamped challenge, then the
/// server's payload echoed back as confirmation.
pub struct SimpleHandshakeClient {
    buf: [u8; C0C1_LEN],
}

impl SimpleHandshakeClient {
    /// Create a fresh client handshake.
    pub fn new() -> Self {
        Self {
            buf: [0u8; C0C1_LEN],
        }
    }
}

impl Default for SimpleHandshakeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientHandshake for SimpleHandshakeClient {
    async fn write_challenge(&mut self, transport: &mut dyn Transport) -> Result<()> {
        self.buf[0] = RTMP_VERSION;
        self.buf[1..5].copy_from_slice(&now_timestamp().to_be_bytes());
        self.buf[5..9].copy_from_slice(&[0; 4]);
        fill_filler(&mut self.buf[9..]);
        transport.write_all(&self.buf).await?;
        Ok(())
    }

    async fn read_response(&mut self, transport: &mut dyn Transport) -> Result<()> {
        // The response is the same size as the challenge; reuse the buffer.
        transport.read_exact(&mut self.buf).await?;
        Ok(())
    }

    async fn write_confirmation(&mut self, transport: &mut dyn Transport) -> Result<()> {
        // Echo S1 back as C2.
        transport.write_all(&self.buf[1..]).await?;
        Ok(())
    }

    async fn read_acknowledgment(&mut self, transport: &mut dyn Transport) -> Result<()> {
        transport.read_exact(&mut self.buf[..S2_LEN]).await?;
        Ok(())
    }

    fn mode(&self) -> HandshakeMode {
        HandshakeMode::Simple
    }
}

/// Client handshake that embeds a digest in the challenge and verifies the
/// server's response, falling back to the simple exchange when no digest is
/// located.
pub struct DigestHandshakeClient {
    buf: [u8; C0C1_LEN],
    mode: HandshakeMode,
}

impl DigestHandshakeClient {
    /// Create a fresh client handshake.
    pub fn new() -> Self {
        Self {
            buf: [0u8; C0C1_LEN],
            mode: HandshakeMode::Complex,
        }
    }
}

impl Default for DigestHandshakeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientHandshake for DigestHandshakeClient {
    async fn write_challenge(&mut self, transport: &mut dyn Transport) -> Result<()> {
        self.buf[0] = RTMP_VERSION;
        // Zero time field: matches the fingerprint of common encoder clients.
        self.buf[1..5].copy_from_slice(&[0; 4]);
        self.buf[5..9].copy_from_slice(&CLIENT_VERSION);
        fill_filler(&mut self.buf[9..]);
        embed_digest(&mut self.buf[1..], 8, &CLIENT_KEY[..CLIENT_PART_KEY_LEN]);
        transport.write_all(&self.buf).await?;
        Ok(())
    }

    async fn read_response(&mut self, transport: &mut dyn Transport) -> Result<()> {
        let mut response = [0u8; C0C1_LEN];
        transport.read_exact(&mut response).await?;

        match parse_challenge(&response, &SERVER_KEY[..SERVER_PART_KEY_LEN], &CLIENT_KEY) {
            Some(reply_key) => {
                // Fresh filler with the reply digest in the trailing window.
                fill_filler(&mut self.buf[..C2_LEN]);
                let window = C2_LEN - DIGEST_LEN;
                let digest = digest_excluding_window(&self.buf[..C2_LEN], window, &reply_key);
                self.buf[window..C2_LEN].copy_from_slice(&digest);
            }
            None => {
                // Server answered without a digest: echo its payload as C2.
                self.mode = HandshakeMode::Simple;
                self.buf[..C2_LEN].copy_from_slice(&response[1..]);
            }
        }
        Ok(())
    }

    async fn write_confirmation(&mut self, transport: &mut dyn Transport) -> Result<()> {
        transport.write_all(&self.buf[..C2_LEN]).await?;
        Ok(())
    }

    async fn read_acknowledgment(&mut self, transport: &mut dyn Transport) -> Result<()> {
        transport.read_exact(&mut self.buf[..S2_LEN]).await?;
        Ok(())
    }

    fn mode(&self) -> HandshakeMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_selects_strategy() {
        assert_eq!(
            ClientHandshakeKind::Simple.strategy().mode(),
            HandshakeMode::Simple
        );
        // Digest clients start out complex; fallback happens on response.
        assert_eq!(
            ClientHandshakeKind::Digest.strategy().mode(),
            HandshakeMode::Complex
        );
    }

    #[tokio::test]
    async fn test_digest_challenge_layout() {
        let (mut near, mut far) = tokio::io::duplex(4096);
        let mut client = DigestHandshakeClient::new();
        client.write_challenge(&mut near).await.unwrap();

        let mut challenge = [0u8; C0C1_LEN];
        far.read_exact(&mut challenge).await.unwrap();
        assert_eq!(challenge[0], RTMP_VERSION);
        assert_eq!(&challenge[1..5], &[0; 4]);
        assert_eq!(&challenge[5..9], &CLIENT_VERSION);
        // The embedded digest is locatable with the client partial key.
        assert!(super::super::digest::find_digest(
            &challenge[1..],
            8,
            &CLIENT_KEY[..CLIENT_PART_KEY_LEN]
        )
        .is_some());
    }

    #[tokio::test]
    async fn test_short_response_is_a_transport_error() {
        let (mut near, mut far) = tokio::io::duplex(8192);
        let mut client = SimpleHandshakeClient::new();
        client.write_challenge(&mut near).await.unwrap();

        // Fewer bytes than a full response, then close.
        far.write_all(&[0u8; 100]).await.unwrap();
        drop(far);

        let err = client.read_response(&mut near).await.unwrap_err();
        assert!(matches!(err, crate::error::RtmpError::Transport(_)));
    }
}
