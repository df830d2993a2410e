//! Legacy P2PKH chain support for the utxo-wallet.
//!
//! Provides Base58Check address encoding, UTXO coin selection, unsigned
//! transaction building, and legacy sighash signing with low-S DER
//! signatures. Chain constants live in [`params::ChainParams`].

pub mod address;
pub mod error;
pub mod keys;
pub mod params;
pub mod script;
pub mod signer;
pub mod transaction;
pub mod utxo;
pub mod varint;

pub use error::{AddressError, ChainError};
pub use keys::{PublicKey, PublicKeyDerivation, SecretKey};
pub use params::ChainParams;
pub use transaction::{Transaction, UnsignedTransaction};
pub use utxo::Utxo;
