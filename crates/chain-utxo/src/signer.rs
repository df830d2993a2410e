//! Legacy (pre-segwit) signing of P2PKH inputs.
//!
//! For each input the signature preimage is the unsigned transaction with that
//! input's script field replaced by the locking script it spends (all other
//! input scripts empty), followed by the sighash type as u32 LE. The digest is
//! its double SHA-256. Signatures are low-S, minimally DER encoded and
//! suffixed with the sighash byte.
//!
//! Signing is all-or-nothing: any failure aborts the whole transaction.

use crypto_utils::hash::double_sha256;
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use tracing::{debug, info};

use crate::error::ChainError;
use crate::keys::{self, SecretKey};
use crate::params::ChainParams;
use crate::script;
use crate::transaction::{self, find_outputs_offset, write_input, Transaction, TxInput};
use crate::utxo::Utxo;
use crate::varint::write_varint;

/// secp256k1 group order n, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n / 2 (rounded down), big-endian. Canonical `s` values never exceed it.
pub const HALF_CURVE_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Replace `s` by `n - s` when it lies in the upper half of the group.
pub fn canonicalize_s(s: [u8; 32]) -> [u8; 32] {
    if s <= HALF_CURVE_ORDER {
        return s;
    }
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - s[i] as i16 - borrow;
        borrow = if diff < 0 {
            diff += 256;
            1
        } else {
            0
        };
        out[i] = diff as u8;
    }
    out
}

/// DER INTEGER of an unsigned big-endian value, minimally encoded.
fn der_integer(out: &mut Vec<u8>, value: &[u8; 32]) {
    let start = value.iter().position(|&b| b != 0).unwrap_or(31);
    let trimmed = &value[start..];
    let pad = trimmed[0] & 0x80 != 0;

    out.push(0x02);
    out.push((trimmed.len() + pad as usize) as u8);
    if pad {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
}

/// Encode `(r, s)` as `SEQUENCE { INTEGER r, INTEGER s }`.
pub fn encode_der(r: &[u8; 32], s: &[u8; 32]) -> Vec<u8> {
    let mut body = Vec::with_capacity(70);
    der_integer(&mut body, r);
    der_integer(&mut body, s);

    let mut der = Vec::with_capacity(body.len() + 2);
    der.push(0x30);
    der.push(body.len() as u8);
    der.extend_from_slice(&body);
    der
}

/// Sign a 32-byte digest and return `DER(r, low-S s) ‖ sighash_byte`.
pub fn sign_digest(
    signing_key: &SigningKey,
    digest: &[u8; 32],
    sighash_byte: u8,
) -> Result<Vec<u8>, ChainError> {
    let signature: Signature = signing_key
        .sign_prehash(digest)
        .map_err(|e| ChainError::SigningError(format!("ECDSA signing failed: {e}")))?;

    let (r, s) = signature.split_bytes();
    let r: [u8; 32] = r.into();
    let s = canonicalize_s(s.into());

    let mut sig = encode_der(&r, &s);
    sig.push(sighash_byte);
    Ok(sig)
}

/// Serialize the preimage for input `index` of an unsigned transaction.
///
/// `unsigned` must be the serialized form of a transaction with `inputs`;
/// its output section and locktime are copied verbatim from `outputs_offset`
/// onward. Offsets outside the buffer are rejected.
pub fn signature_preimage(
    unsigned: &[u8],
    inputs: &[TxInput],
    outputs_offset: usize,
    index: usize,
    locking_script: &[u8],
    sighash_type: u32,
) -> Result<Vec<u8>, ChainError> {
    if unsigned.len() < 4 {
        return Err(ChainError::MalformedTransactionHex(format!(
            "transaction of {} bytes has no version field",
            unsigned.len()
        )));
    }
    if outputs_offset < 4 || outputs_offset >= unsigned.len() {
        return Err(ChainError::MalformedTransactionHex(format!(
            "output section offset {outputs_offset} outside {} byte transaction",
            unsigned.len()
        )));
    }
    if index >= inputs.len() {
        return Err(ChainError::SigningError(format!(
            "input index {index} out of bounds ({} inputs)",
            inputs.len()
        )));
    }

    let mut preimage = Vec::with_capacity(unsigned.len() + locking_script.len() + 4);
    preimage.extend_from_slice(&unsigned[..4]);
    write_varint(&mut preimage, inputs.len() as u64);
    for (i, input) in inputs.iter().enumerate() {
        let script: &[u8] = if i == index { locking_script } else { &[] };
        write_input(&mut preimage, input, script);
    }
    preimage.extend_from_slice(&unsigned[outputs_offset..]);
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    Ok(preimage)
}

/// Digest signed for input `index`: double SHA-256 of its preimage.
pub fn signature_digest(
    unsigned: &[u8],
    index: usize,
    locking_script: &[u8],
    params: &ChainParams,
) -> Result<[u8; 32], ChainError> {
    let tx = Transaction::decode(unsigned)?;
    let offset = find_outputs_offset(unsigned, tx.inputs.len())?;
    let preimage = signature_preimage(
        unsigned,
        &tx.inputs,
        offset,
        index,
        locking_script,
        params.sighash_type,
    )?;
    Ok(double_sha256(&preimage))
}

fn find_prevout<'a>(prevouts: &'a [Utxo], input: &TxInput) -> Result<&'a Utxo, ChainError> {
    let mut display_txid = input.prev_txid;
    display_txid.reverse();
    let txid_hex = hex::encode(display_txid);

    prevouts
        .iter()
        .find(|utxo| {
            utxo.output_index == input.prev_index && utxo.txid.eq_ignore_ascii_case(&txid_hex)
        })
        .ok_or_else(|| ChainError::MissingLockingScript(format!("{txid_hex}:{}", input.prev_index)))
}

/// Sign every input of a serialized unsigned transaction.
///
/// `prevouts` must contain, for each input, the UTXO it spends with its
/// locking script. The key derivation used for each input is the one whose
/// Hash160 the locking script commits to.
pub fn sign_transaction(
    unsigned: &[u8],
    prevouts: &[Utxo],
    secret: &SecretKey,
    params: &ChainParams,
) -> Result<Vec<u8>, ChainError> {
    params.validate()?;

    let tx = Transaction::decode(unsigned)?;
    if tx.inputs.is_empty() {
        return Err(ChainError::MalformedTransactionHex(
            "transaction has no inputs".into(),
        ));
    }
    if !tx.is_unsigned() {
        return Err(ChainError::MalformedTransactionHex(
            "transaction already carries input scripts".into(),
        ));
    }

    let outputs_offset = find_outputs_offset(unsigned, tx.inputs.len())?;
    let signing_key = secret.signing_key()?;

    let mut script_sigs: Vec<Vec<u8>> = Vec::with_capacity(tx.inputs.len());
    for (index, input) in tx.inputs.iter().enumerate() {
        let prevout = find_prevout(prevouts, input)?;
        let locking_script = prevout.locking_script_bytes()?;
        let committed = script::p2pkh_hash(&locking_script).ok_or_else(|| {
            ChainError::UnsupportedScript(format!(
                "{} is not pay-to-pubkey-hash",
                prevout.outpoint()
            ))
        })?;

        let (derivation, pubkey) = keys::detect_derivation(secret, &committed)?;

        let preimage = signature_preimage(
            unsigned,
            &tx.inputs,
            outputs_offset,
            index,
            &locking_script,
            params.sighash_type,
        )?;
        let digest = double_sha256(&preimage);
        let signature = sign_digest(&signing_key, &digest, params.sighash_byte())?;

        debug!(
            input = index,
            outpoint = %prevout.outpoint(),
            %derivation,
            "signed input"
        );
        script_sigs.push(script::p2pkh_script_sig(&signature, pubkey.as_bytes())?);
    }

    let signed = assemble_signed(unsigned, &tx.inputs, outputs_offset, &script_sigs);
    info!(
        txid = %transaction::txid(&signed),
        inputs = tx.inputs.len(),
        "transaction signed"
    );
    Ok(signed)
}

/// Hex-in, hex-out variant of [`sign_transaction`].
pub fn sign_transaction_hex(
    unsigned_hex: &str,
    prevouts: &[Utxo],
    secret: &SecretKey,
    params: &ChainParams,
) -> Result<String, ChainError> {
    let unsigned = hex::decode(unsigned_hex.trim())
        .map_err(|e| ChainError::MalformedTransactionHex(format!("invalid hex: {e}")))?;
    sign_transaction(&unsigned, prevouts, secret, params).map(hex::encode)
}

/// Rebuild the transaction with real input scripts, copying the output
/// section and locktime bytes unchanged.
fn assemble_signed(
    unsigned: &[u8],
    inputs: &[TxInput],
    outputs_offset: usize,
    script_sigs: &[Vec<u8>],
) -> Vec<u8> {
    let script_bytes: usize = script_sigs.iter().map(|s| s.len() + 2).sum();
    let mut signed = Vec::with_capacity(unsigned.len() + script_bytes);
    signed.extend_from_slice(&unsigned[..4]);
    write_varint(&mut signed, inputs.len() as u64);
    for (input, script_sig) in inputs.iter().zip(script_sigs) {
        write_input(&mut signed, input, script_sig);
    }
    signed.extend_from_slice(&unsigned[outputs_offset..]);
    signed
}
