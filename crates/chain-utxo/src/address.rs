use crypto_utils::base58;
use crypto_utils::CryptoError;

use crate::error::{AddressError, ChainError};
use crate::keys::PublicKey;
use crate::params::ChainParams;

/// Version byte plus the 20-byte pubkey hash.
pub const ADDRESS_PAYLOAD_LEN: usize = 21;

/// Derive the P2PKH address of a compressed public key.
///
/// Steps:
/// 1. Hash160(pubkey) -> 20-byte pubkey hash
/// 2. Prepend the chain's version byte
/// 3. Base58Check encode (4-byte double SHA-256 checksum)
pub fn encode_address(pubkey: &PublicKey, params: &ChainParams) -> String {
    hash160_to_address(&pubkey.hash160(), params)
}

/// Encode an already computed pubkey hash as an address.
pub fn hash160_to_address(pubkey_hash: &[u8; 20], params: &ChainParams) -> String {
    let mut payload = [0u8; ADDRESS_PAYLOAD_LEN];
    payload[0] = params.address_version;
    payload[1..].copy_from_slice(pubkey_hash);
    base58::check_encode(&payload)
}

/// Fully validate an address and return its 21-byte payload.
pub fn decode_address(
    address: &str,
    params: &ChainParams,
) -> Result<[u8; ADDRESS_PAYLOAD_LEN], AddressError> {
    if !address.starts_with(params.address_prefix) {
        return Err(AddressError::WrongPrefix {
            expected: params.address_prefix,
        });
    }

    let payload = base58::check_decode(address).map_err(|e| match e {
        CryptoError::ChecksumMismatch { .. } => AddressError::BadChecksum,
        other => AddressError::Malformed(other.to_string()),
    })?;

    let payload: [u8; ADDRESS_PAYLOAD_LEN] = payload
        .as_slice()
        .try_into()
        .map_err(|_| AddressError::WrongLength(payload.len()))?;

    if payload[0] != params.address_version {
        return Err(AddressError::WrongVersion {
            expected: params.address_version,
            found: payload[0],
        });
    }

    Ok(payload)
}

/// Extract the 20-byte pubkey hash from a validated address.
pub fn address_to_hash160(address: &str, params: &ChainParams) -> Result<[u8; 20], ChainError> {
    let payload = decode_address(address, params)?;
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(hash)
}

/// `true` if `address` passes every check of [`decode_address`].
pub fn validate_address(address: &str, params: &ChainParams) -> bool {
    decode_address(address, params).is_ok()
}
