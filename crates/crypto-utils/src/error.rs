use thiserror::Error;

/// Errors raised by the hashing and encoding primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("base58 decode failed: {0}")]
    Base58Decode(String),

    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    #[error("invalid key length")]
    InvalidKeyLength,
}
