use thiserror::Error;

/// Reasons an address string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("malformed address: {0}")]
    Malformed(String),

    #[error("address checksum mismatch")]
    BadChecksum,

    #[error("address must start with '{expected}'")]
    WrongPrefix { expected: char },

    #[error("wrong version byte: expected 0x{expected:02x}, found 0x{found:02x}")]
    WrongVersion { expected: u8, found: u8 },

    #[error("wrong payload length: expected 21 bytes, found {0}")]
    WrongLength(usize),
}

/// Chain-level errors: keys, addresses, coin selection, codec and signing.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid utxo: {0}")]
    InvalidUtxo(String),

    #[error("invalid txid: {0}")]
    InvalidTxid(String),

    #[error("malformed transaction hex: {0}")]
    MalformedTransactionHex(String),

    #[error("missing locking script for {0}")]
    MissingLockingScript(String),

    #[error("unsupported locking script: {0}")]
    UnsupportedScript(String),

    #[error("key mismatch: no derivation of this key hashes to {committed}")]
    KeyMismatch { committed: String },

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("invalid chain parameters: {0}")]
    InvalidParams(String),
}
