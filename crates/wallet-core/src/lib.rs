//! # wallet-core
//!
//! Single-key wallet over the legacy P2PKH chain: recovery phrases, secret
//! import, address derivation, and the select → encode → sign pipeline.
//!
//! Network access, wallet files and their encryption live elsewhere; this
//! crate only consumes UTXO lists and produces signed transaction bytes.

pub mod error;
pub mod keys;
pub mod mnemonic;

use chain_utxo::{
    address, signer, transaction, ChainParams, PublicKey, PublicKeyDerivation, SecretKey,
    UnsignedTransaction, Utxo,
};
use tracing::info;
use zeroize::Zeroizing;

pub use chain_utxo::address::validate_address;
pub use error::WalletError;
pub use mnemonic::{generate_mnemonic, is_valid_word, validate_mnemonic};

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub bytes: Vec<u8>,
    pub txid: String,
    pub fee: u64,
}

impl SignedTransaction {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

/// One secret key, the derivation its address was built with, and the chain
/// parameters it operates under.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret: SecretKey,
    derivation: PublicKeyDerivation,
    params: ChainParams,
}

impl Wallet {
    /// Create a fresh wallet. Returns it with its 12-word recovery phrase.
    pub fn create(params: ChainParams) -> Result<(Self, Zeroizing<String>), WalletError> {
        let phrase = mnemonic::generate_mnemonic()?;
        let wallet = Self::from_mnemonic(&phrase, params)?;
        info!(derivation = %wallet.derivation, "created wallet");
        Ok((wallet, phrase))
    }

    /// Restore from a recovery phrase. Always uses the standard derivation.
    pub fn from_mnemonic(phrase: &str, params: ChainParams) -> Result<Self, WalletError> {
        params.validate()?;
        let secret = keys::secret_from_mnemonic(phrase)?;
        Ok(Self {
            secret,
            derivation: PublicKeyDerivation::Standard,
            params,
        })
    }

    /// Import a raw secret (exactly 64 hex characters).
    pub fn from_secret_hex(
        secret_hex: &str,
        derivation: PublicKeyDerivation,
        params: ChainParams,
    ) -> Result<Self, WalletError> {
        let secret = SecretKey::from_hex(secret_hex)?;
        Self::from_secret(secret, derivation, params)
    }

    pub fn from_secret(
        secret: SecretKey,
        derivation: PublicKeyDerivation,
        params: ChainParams,
    ) -> Result<Self, WalletError> {
        params.validate()?;
        Ok(Self {
            secret,
            derivation,
            params,
        })
    }

    pub fn derivation(&self) -> PublicKeyDerivation {
        self.derivation
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn public_key(&self) -> Result<PublicKey, WalletError> {
        Ok(self.secret.public_key(self.derivation)?)
    }

    /// The wallet's receive (and change) address.
    pub fn address(&self) -> Result<String, WalletError> {
        Ok(address::encode_address(&self.public_key()?, &self.params))
    }

    /// The secret as 64 lowercase hex characters.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        self.secret.to_hex()
    }

    /// Select inputs and build the unsigned spend, sending change back to
    /// this wallet's address.
    pub fn build_unsigned(
        &self,
        utxos: &[Utxo],
        recipient: &str,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError> {
        let change_address = self.address()?;
        Ok(transaction::build_unsigned_transaction(
            utxos,
            recipient,
            amount,
            &change_address,
            &self.params,
        )?)
    }

    /// Sign every input of an unsigned transaction built by this wallet.
    pub fn sign(&self, unsigned: &UnsignedTransaction) -> Result<SignedTransaction, WalletError> {
        let bytes = signer::sign_transaction(
            &unsigned.tx.encode(),
            &unsigned.prevouts,
            &self.secret,
            &self.params,
        )?;
        Ok(SignedTransaction {
            txid: transaction::txid(&bytes),
            bytes,
            fee: unsigned.fee,
        })
    }

    /// Sign an unsigned transaction given as hex, with the UTXOs it spends.
    pub fn sign_hex(&self, unsigned_hex: &str, prevouts: &[Utxo]) -> Result<String, WalletError> {
        Ok(signer::sign_transaction_hex(
            unsigned_hex,
            prevouts,
            &self.secret,
            &self.params,
        )?)
    }

    /// Select, encode and sign in one step.
    pub fn send(
        &self,
        utxos: &[Utxo],
        recipient: &str,
        amount: u64,
    ) -> Result<SignedTransaction, WalletError> {
        let unsigned = self.build_unsigned(utxos, recipient, amount)?;
        let signed = self.sign(&unsigned)?;
        info!(
            txid = %signed.txid,
            amount,
            fee = signed.fee,
            inputs = unsigned.tx.inputs.len(),
            "built signed spend"
        );
        Ok(signed)
    }
}
