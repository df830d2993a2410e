//! Pay-to-pubkey-hash locking scripts and the matching unlocking scripts.

use crate::error::ChainError;

pub const OP_PUSHDATA1: u8 = 0x4C;
pub const OP_PUSHDATA2: u8 = 0x4D;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xA9;
pub const OP_CHECKSIG: u8 = 0xAC;

/// Length of a P2PKH locking script.
pub const P2PKH_SCRIPT_LEN: usize = 25;

/// Build a P2PKH scriptPubKey: OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(P2PKH_SCRIPT_LEN);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(0x14); // Push 20 bytes
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// The pubkey hash a P2PKH script commits to, or `None` for any other script.
pub fn p2pkh_hash(script: &[u8]) -> Option<[u8; 20]> {
    match script {
        [OP_DUP, OP_HASH160, 0x14, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            hash.try_into().ok()
        }
        _ => None,
    }
}

/// Append a minimal data push of `data` to `script`.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) -> Result<(), ChainError> {
    match data.len() {
        len @ 0..=0x4B => script.push(len as u8),
        len @ 0x4C..=0xFF => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len @ 0x100..=0xFFFF => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            return Err(ChainError::SigningError(format!(
                "push of {len} bytes exceeds script limits"
            )))
        }
    }
    script.extend_from_slice(data);
    Ok(())
}

/// P2PKH scriptSig: <sig+hashtype> <pubkey>
pub fn p2pkh_script_sig(signature: &[u8], pubkey: &[u8]) -> Result<Vec<u8>, ChainError> {
    let mut script = Vec::with_capacity(2 + signature.len() + pubkey.len());
    push_data(&mut script, signature)?;
    push_data(&mut script, pubkey)?;
    Ok(script)
}
