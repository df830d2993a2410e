//! Secret keys and the two public-key derivations.
//!
//! [`PublicKeyDerivation::Standard`] is ordinary secp256k1 point
//! multiplication. [`PublicKeyDerivation::Legacy`] is a non-curve placeholder
//! older wallets used to build their addresses: funds locked to those
//! addresses can only be spent by reproducing it byte for byte. Never create
//! new wallets with it.

use std::fmt;

use crypto_utils::hash::{hash160, hmac_sha256};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::ChainError;

/// HMAC key used by the legacy public-key derivation.
pub const LEGACY_PUBKEY_LABEL: &[u8] = b"utxo-wallet/legacy-pubkey";

/// A valid secp256k1 secret scalar (`1 <= k < n`), wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Accept exactly 32 bytes forming a valid scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let raw: [u8; 32] = bytes.try_into().map_err(|_| {
            ChainError::InvalidSecretKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        SigningKey::from_slice(&raw)
            .map_err(|_| ChainError::InvalidSecretKey("scalar out of range".into()))?;
        Ok(Self(raw))
    }

    /// Accept exactly 64 hex characters forming a valid scalar.
    pub fn from_hex(secret_hex: &str) -> Result<Self, ChainError> {
        if secret_hex.len() != 64 {
            return Err(ChainError::InvalidSecretKey(format!(
                "expected 64 hex characters, got {}",
                secret_hex.len()
            )));
        }
        let bytes = Zeroizing::new(
            hex::decode(secret_hex)
                .map_err(|e| ChainError::InvalidSecretKey(format!("invalid hex: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Lowercase hex form, wiped when the returned string is dropped.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// ECDSA signing key for this scalar.
    pub(crate) fn signing_key(&self) -> Result<SigningKey, ChainError> {
        SigningKey::from_slice(&self.0)
            .map_err(|_| ChainError::InvalidSecretKey("scalar out of range".into()))
    }

    /// Public key under the given derivation.
    pub fn public_key(&self, derivation: PublicKeyDerivation) -> Result<PublicKey, ChainError> {
        match derivation {
            PublicKeyDerivation::Standard => {
                let signing_key = self.signing_key()?;
                let point = signing_key.verifying_key().to_encoded_point(true);
                PublicKey::from_bytes(point.as_bytes())
            }
            PublicKeyDerivation::Legacy => {
                let mac = hmac_sha256(LEGACY_PUBKEY_LABEL, &self.0)
                    .map_err(|e| ChainError::InvalidPublicKey(e.to_string()))?;
                let mut bytes = [0u8; 33];
                bytes[0] = if mac[31] % 2 == 0 { 0x02 } else { 0x03 };
                bytes[1..].copy_from_slice(&mac);
                Ok(PublicKey(bytes))
            }
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Which public-key derivation produced a wallet's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicKeyDerivation {
    Standard,
    Legacy,
}

impl PublicKeyDerivation {
    /// Every derivation, in the order the signer tries them.
    pub const ALL: [PublicKeyDerivation; 2] =
        [PublicKeyDerivation::Standard, PublicKeyDerivation::Legacy];
}

impl fmt::Display for PublicKeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKeyDerivation::Standard => write!(f, "standard"),
            PublicKeyDerivation::Legacy => write!(f, "legacy"),
        }
    }
}

/// A 33-byte compressed public key (`0x02`/`0x03` prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    /// Validate length and compressed prefix. Curve membership is not
    /// checked since legacy keys are not curve points.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let raw: [u8; 33] = bytes.try_into().map_err(|_| {
            ChainError::InvalidPublicKey(format!("expected 33 bytes, got {}", bytes.len()))
        })?;
        if raw[0] != 0x02 && raw[0] != 0x03 {
            return Err(ChainError::InvalidPublicKey(
                "compressed key must start with 0x02 or 0x03".into(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Find the derivation of `secret` whose Hash160 equals `committed`.
pub fn detect_derivation(
    secret: &SecretKey,
    committed: &[u8; 20],
) -> Result<(PublicKeyDerivation, PublicKey), ChainError> {
    for derivation in PublicKeyDerivation::ALL {
        let pubkey = secret.public_key(derivation)?;
        if &pubkey.hash160() == committed {
            return Ok((derivation, pubkey));
        }
    }
    Err(ChainError::KeyMismatch {
        committed: hex::encode(committed),
    })
}
