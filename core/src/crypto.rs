//! Cryptographic primitives shared across the engine.
//!
//! Every hash the engine produces — block hashes, merkle roots, audit entry
//! hashes, transaction digests — goes through [`sha256_hex`] so the whole
//! chain speaks one hash algorithm end to end.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::HexHash;

/// 64 zero characters: the `previousHash` of the genesis block and the
/// `previousHash` of the first audit entry.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Returns the SHA-256 digest of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> HexHash {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Fills `n` bytes from a cryptographically secure source.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Generates a fresh 64-hex transaction id from 32 random bytes.
pub fn new_tx_id() -> HexHash {
    hex::encode(random_bytes(32))
}

/// Generates an instrument id of the form `"<prefix>-<base36 ts>-<16 hex>"`.
pub fn new_instrument_id(prefix: &str, now_millis: i64) -> String {
    let ts36 = to_base36(now_millis.max(0) as u128);
    let suffix = hex::encode(random_bytes(8));
    format!("{prefix}-{ts36}-{suffix}")
}

/// Computes the tamper-evidence digest for a sealed transaction.
///
/// This is a SHA-256 digest over deterministic inputs, not a non-repudiation
/// signature: it guarantees that `tx_id` cannot be modified post-signing
/// without detection, nothing more.
pub fn sign_tx(tx_id: &str, validator_id: &str, now_millis: i64) -> HexHash {
    sha256_hex(format!("{tx_id}|{validator_id}|{now_millis}").as_bytes())
}

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let rem = (value % 36) as usize;
        digits.push(BASE36_ALPHABET[rem]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 alphabet is ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"hellp"));
    }

    #[test]
    fn sha256_hex_empty_matches_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn new_tx_id_is_64_hex_chars_and_varies() {
        let a = new_tx_id();
        let b = new_tx_id();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn new_instrument_id_has_prefix_and_three_parts() {
        let id = new_instrument_id("GBDC", 1_700_000_000_000);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "GBDC");
        assert_eq!(parts[2].len(), 16);
    }

    #[test]
    fn base36_roundtrips_small_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn sign_tx_is_deterministic_digest() {
        let a = sign_tx("tx1", "validator", 1000);
        let b = sign_tx("tx1", "validator", 1000);
        let c = sign_tx("tx1", "validator", 1001);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
