use bip39::{Language, Mnemonic};
use crypto_utils::random::secure_random;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Bytes of entropy behind a fresh phrase (12 words).
pub const ENTROPY_BYTES: usize = 16;

/// Generate a new 12-word BIP-39 mnemonic (128 bits of entropy)
pub fn generate_mnemonic() -> Result<Zeroizing<String>, WalletError> {
    let entropy = secure_random::<ENTROPY_BYTES>();
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Validate a mnemonic phrase (word list and checksum)
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
}

/// Derive the 64-byte BIP-39 seed from a phrase and passphrase.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Get the word list for autocomplete
pub fn word_list() -> &'static [&'static str] {
    Language::English.word_list()
}

/// Validate a single word against the BIP-39 word list
pub fn is_valid_word(word: &str) -> bool {
    Language::English.find_word(word).is_some()
}
