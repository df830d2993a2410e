//! # crypto-utils
//!
//! Hashing, base58 text encoding and secure random generation utilities
//! shared by the wallet crates.

pub mod base58;
pub mod error;
pub mod hash;
pub mod random;

pub use error::CryptoError;
