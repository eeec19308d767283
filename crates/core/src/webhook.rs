// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook tokens and HMAC signature verification
//!
//! Each webhook-enabled script carries a shared-secret token (routing)
//! and optionally an HMAC secret. When signature verification is
//! required, the caller presents hex(HMAC-SHA256(secret, body)); a
//! `sha256=` prefix is tolerated.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate a webhook routing token (32 hex chars)
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Generate a webhook HMAC secret (64 hex chars, 32 random bytes)
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex_encode(&bytes)
}

/// Compute the hex HMAC-SHA256 signature of a payload
pub fn sign(secret: &str, payload: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        // HMAC accepts any key length; unreachable in practice
        return String::new();
    };
    mac.update(payload.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

/// Verify a presented signature against the payload, in constant time
pub fn verify_signature(secret: &str, payload: &str, signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());

    let presented = signature.trim().trim_start_matches("sha256=");
    let Some(bytes) = hex_decode(presented) else {
        return false;
    };
    mac.verify_slice(&bytes).is_ok()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{:02x}", b);
        acc
    })
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
