// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer and publish token generation and verification.
//!
//! Tokens are never stored in plaintext; only their SHA-256 hash is
//! persisted, and comparisons against a caller-supplied token run in
//! constant time to avoid leaking timing information about how much of
//! the token matched.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 24;

/// Generate a new random token, hex-encoded to 48 characters.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// SHA-256 hash of a token, hex-encoded, for at-rest storage.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex_encode(&digest)
}

/// Constant-time comparison of a caller-supplied token against a stored
/// hash. Returns `false` on any length mismatch without short-circuiting
/// on the first differing byte.
pub fn verify_token(candidate: &str, stored_hash: &str) -> bool {
    let candidate_hash = hash_token(candidate);
    if candidate_hash.len() != stored_hash.len() {
        return false;
    }
    candidate_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
