//! Seed-to-secret derivation.
//!
//! Wallets derive their secret scalar from the BIP-39 seed with two salted
//! SHA-256 rounds instead of BIP-32. This is a non-standard scheme kept
//! bit-for-bit so existing addresses stay spendable. Do not reuse it
//! elsewhere.

use crypto_utils::hash::sha256;
use chain_utxo::SecretKey;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::mnemonic;

/// Salt appended to each SHA-256 round of the secret derivation.
pub const SECRET_DERIVATION_SALT: &[u8] = b"utxo-wallet/secret-derivation";

/// `SHA256(SHA256(seed ‖ salt) ‖ salt)`, validated as a secp256k1 scalar.
pub fn derive_secret_from_seed(seed: &[u8]) -> Result<SecretKey, WalletError> {
    let mut buf = Zeroizing::new(Vec::with_capacity(seed.len() + SECRET_DERIVATION_SALT.len()));
    buf.extend_from_slice(seed);
    buf.extend_from_slice(SECRET_DERIVATION_SALT);
    let first = Zeroizing::new(sha256(&buf));

    buf.clear();
    buf.extend_from_slice(&first[..]);
    buf.extend_from_slice(SECRET_DERIVATION_SALT);
    let second = Zeroizing::new(sha256(&buf));

    SecretKey::from_bytes(&second[..])
        .map_err(|e| WalletError::DerivationFailed(format!("derived scalar rejected: {e}")))
}

/// Validate a phrase, stretch it to a seed (empty passphrase) and derive the secret.
pub fn secret_from_mnemonic(phrase: &str) -> Result<SecretKey, WalletError> {
    if !mnemonic::validate_mnemonic(phrase) {
        return Err(WalletError::InvalidMnemonic(
            "phrase fails word list or checksum validation".into(),
        ));
    }
    let seed = mnemonic::mnemonic_to_seed(phrase, "")?;
    derive_secret_from_seed(&seed[..])
}
