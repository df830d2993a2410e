use crypto_utils::base58;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

/// SIGHASH_ALL: the signature commits to every input and output.
pub const SIGHASH_ALL: u32 = 0x01;

/// Immutable chain configuration passed explicitly into the address codec,
/// coin selector, transaction codec and signer.
///
/// Missing fields fall back to [`ChainParams::default`] when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Version byte prepended to the pubkey hash in addresses.
    pub address_version: u8,
    /// First character every address of this chain starts with.
    pub address_prefix: char,
    /// Floor applied to every fee estimate, in minor units.
    pub min_fee: u64,
    /// Fee charged per started kilobyte of estimated size, in minor units.
    pub fee_per_kb: u64,
    /// Transaction format version.
    pub tx_version: u32,
    /// Sequence number given to every new input.
    pub sequence: u32,
    /// Sighash type appended to preimages and signatures.
    pub sighash_type: u32,
    /// Locktime written into every transaction.
    pub lock_time: u32,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            address_version: 0x00,
            address_prefix: '1',
            min_fee: 10_000,
            fee_per_kb: 10_000,
            tx_version: 1,
            sequence: 0xFFFF_FFFE,
            sighash_type: SIGHASH_ALL,
            lock_time: 0,
        }
    }
}

impl ChainParams {
    /// Parse parameters from JSON, filling absent fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ChainError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| ChainError::InvalidParams(format!("failed to parse: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Reject combinations the signer cannot express.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.sighash_type > u8::MAX as u32 {
            return Err(ChainError::InvalidParams(format!(
                "sighash type {:#x} does not fit the signature suffix byte",
                self.sighash_type
            )));
        }
        if !base58::is_base58_char(self.address_prefix) {
            return Err(ChainError::InvalidParams(format!(
                "address prefix {:?} is not a base58 character",
                self.address_prefix
            )));
        }
        Ok(())
    }

    /// Sighash type as the single byte appended to DER signatures.
    pub fn sighash_byte(&self) -> u8 {
        self.sighash_type as u8
    }
}
