//! Digest engine for the complex handshake.
//!
//! Complex-mode packets carry an HMAC-SHA256 digest embedded inside the
//! 1528-byte filler region. The 32-byte window holding the digest is
//! excluded from the digested input, and the window's offset is derived
//! from four bytes at a fixed search base, so a verifier can locate the
//! digest without any side channel.
//!
//! Verification failure is reported as `None`, never as an error: the
//! caller uses it to fall back to the simple handshake.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::DIGEST_LEN;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `data` under `key`.
pub(crate) fn make_digest(data: &[u8], key: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(data);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// HMAC-SHA256 of `buf` with the window at `[offset, offset + 32)` skipped.
///
/// Used both to embed a digest (compute, then write into the window) and to
/// verify one already present (compute, then compare with the window).
pub(crate) fn digest_excluding_window(buf: &[u8], offset: usize, key: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key size");
    if offset > 0 {
        mac.update(&buf[..offset]);
    }
    if offset + DIGEST_LEN < buf.len() {
        mac.update(&buf[offset + DIGEST_LEN..]);
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Window offset derived from the four bytes at `base`: their sum reduced
/// modulo 728, shifted past the derivation bytes themselves.
fn window_offset(buf: &[u8], base: usize) -> usize {
    let sum: usize = buf[base..base + 4].iter().map(|&b| usize::from(b)).sum();
    sum % 728 + base + 4
}

/// Embed a digest keyed by `key` into `buf`, at the window derived from the
/// four bytes at `base`. Returns the window offset.
pub(crate) fn embed_digest(buf: &mut [u8], base: usize, key: &[u8]) -> usize {
    let offset = window_offset(buf, base);
    let digest = digest_excluding_window(buf, offset, key);
    buf[offset..offset + DIGEST_LEN].copy_from_slice(&digest);
    offset
}

/// Locate a digest relative to `base` and verify it.
///
/// Returns the window offset only when the recomputed digest matches the
/// bytes actually present in the window.
pub(crate) fn find_digest(buf: &[u8], base: usize, key: &[u8]) -> Option<usize> {
    let offset = window_offset(buf, base);
    let expected = digest_excluding_window(buf, offset, key);
    if buf[offset..offset + DIGEST_LEN] == expected {
        Some(offset)
    } else {
        None
    }
}

/// Inspect a 1537-byte challenge/response packet and, when it carries a
/// verifiable digest, derive the key for the reply digest.
///
/// `None` selects the simple handshake: either the peer declared a zero
/// version field, or no digest verified at either of the two legal layouts
/// (searched at base 772 first, then base 8).
pub(crate) fn parse_challenge(
    packet: &[u8],
    peer_partial_key: &[u8],
    own_full_key: &[u8],
) -> Option<[u8; DIGEST_LEN]> {
    let version = u32::from_be_bytes([packet[5], packet[6], packet[7], packet[8]]);
    if version == 0 {
        tracing::debug!("peer version field is zero, simple handshake");
        return None;
    }

    let payload = &packet[1..];
    let offset = find_digest(payload, 764 + 8, peer_partial_key)
        .or_else(|| find_digest(payload, 8, peer_partial_key));

    match offset {
        Some(offset) => {
            tracing::debug!(offset, "complex handshake digest located");
            Some(make_digest(
                &payload[offset..offset + DIGEST_LEN],
                own_full_key,
            ))
        }
        None => {
            tracing::debug!("no digest located, falling back to simple handshake");
            None
        }
    }
}
