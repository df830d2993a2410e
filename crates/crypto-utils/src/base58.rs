//! Base58 and Base58Check text encoding (Bitcoin alphabet).
//!
//! Each leading zero byte maps to a leading `'1'`. The empty buffer encodes to
//! the empty string and back.

use crate::error::CryptoError;
use crate::hash::checksum4;

/// The Bitcoin base58 alphabet (no `0`, `O`, `I` or `l`).
pub const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub fn is_base58_char(c: char) -> bool {
    ALPHABET.contains(c)
}

/// Encode `data` as base58.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Decode a base58 string.
pub fn decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CryptoError::Base58Decode(e.to_string()))
}

/// Encode `data ‖ double_sha256(data)[..4]` as base58.
pub fn check_encode(data: &[u8]) -> String {
    let mut buf = Vec::with_capacity(data.len() + 4);
    buf.extend_from_slice(data);
    buf.extend_from_slice(&checksum4(data));
    encode(&buf)
}

/// Decode a base58check string and return the payload without its checksum.
///
/// A checksum failure is reported as [`CryptoError::ChecksumMismatch`]; every
/// other failure (bad character, fewer than four bytes) as
/// [`CryptoError::Base58Decode`].
pub fn check_decode(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let mut raw = decode(encoded)?;
    if raw.len() < 4 {
        return Err(CryptoError::Base58Decode(format!(
            "expected at least 4 bytes, got {}",
            raw.len()
        )));
    }

    let split = raw.len() - 4;
    let expected = checksum4(&raw[..split]);
    if raw[split..] != expected {
        return Err(CryptoError::ChecksumMismatch {
            expected: hex::encode(expected),
            found: hex::encode(&raw[split..]),
        });
    }

    raw.truncate(split);
    Ok(raw)
}
