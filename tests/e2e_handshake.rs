//! End-to-end handshake exchanges.
//!
//! These drive both roles against each other over an in-memory duplex
//! transport, beyond what the per-module unit tests cover: mode agreement,
//! simple-mode fallback, and exact-length failure behavior.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use rtmp::{
    handshake_client, handshake_server, ClientHandshakeKind, HandshakeMode, RtmpError,
    RTMP_VERSION,
};

/// A digest client against an auto-detecting server: both sides agree on
/// complex mode.
#[tokio::test]
async fn test_complex_handshake_round_trip() {
    let (mut client_end, mut server_end) = tokio::io::duplex(16384);

    let server = tokio::spawn(async move { handshake_server(&mut server_end).await });

    let mut strategy = ClientHandshakeKind::Digest.strategy();
    let client_mode = handshake_client(&mut client_end, strategy.as_mut())
        .await
        .unwrap();
    let server_mode = server.await.unwrap().unwrap();

    assert_eq!(client_mode, HandshakeMode::Complex);
    assert_eq!(server_mode, HandshakeMode::Complex);
}

/// A client presenting a zero version field forces simple mode on the
/// server.
#[tokio::test]
async fn test_simple_client_forces_simple_mode() {
    let (mut client_end, mut server_end) = tokio::io::duplex(16384);

    let server = tokio::spawn(async move { handshake_server(&mut server_end).await });

    let mut strategy = ClientHandshakeKind::Simple.strategy();
    let client_mode = handshake_client(&mut client_end, strategy.as_mut())
        .await
        .unwrap();
    let server_mode = server.await.unwrap().unwrap();

    assert_eq!(client_mode, HandshakeMode::Simple);
    assert_eq!(server_mode, HandshakeMode::Simple);
}

/// A digest client falls back to simple mode when the server's response
/// carries no digest.
#[tokio::test]
async fn test_digest_client_falls_back_on_plain_server() {
    let (mut client_end, mut server_end) = tokio::io::duplex(16384);

    // Scripted peer: a server that never embeds digests and echoes the
    // client's payload, version field zero.
    let server = tokio::spawn(async move {
        let mut challenge = [0u8; 1537];
        server_end.read_exact(&mut challenge).await.unwrap();

        let mut response = [0u8; 1537];
        response[0] = RTMP_VERSION;
        // time, version field, and filler all left zero
        server_end.write_all(&response).await.unwrap();

        let mut confirmation = [0u8; 1536];
        server_end.read_exact(&mut confirmation).await.unwrap();
        // Final acknowledgment: echo the client payload.
        server_end.write_all(&challenge[1..]).await.unwrap();
    });

    let mut strategy = ClientHandshakeKind::Digest.strategy();
    let client_mode = handshake_client(&mut client_end, strategy.as_mut())
        .await
        .unwrap();
    server.await.unwrap();

    assert_eq!(client_mode, HandshakeMode::Simple);
}

/// A short challenge aborts the server handshake with a transport error,
/// never a partial-state success.
#[tokio::test]
async fn test_short_challenge_aborts_server() {
    let (mut client_end, mut server_end) = tokio::io::duplex(16384);

    client_end.write_all(&[RTMP_VERSION; 100]).await.unwrap();
    drop(client_end);

    let err = handshake_server(&mut server_end).await.unwrap_err();
    assert!(matches!(err, RtmpError::Transport(_)));
}

/// A server that closes mid-reply aborts the client handshake.
#[tokio::test]
async fn test_truncated_response_aborts_client() {
    let (mut client_end, mut server_end) = tokio::io::duplex(16384);

    let server = tokio::spawn(async move {
        let mut challenge = [0u8; 1537];
        server_end.read_exact(&mut challenge).await.unwrap();
        // Less than a full response, then close.
        server_end.write_all(&[RTMP_VERSION; 512]).await.unwrap();
        drop(server_end);
    });

    let mut strategy = ClientHandshakeKind::Digest.strategy();
    let err = handshake_client(&mut client_end, strategy.as_mut())
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, RtmpError::Transport(_)));
}
