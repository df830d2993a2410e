//! Cross-crate integration tests exercising the full pipeline:
//! phrase/secret -> address -> coin selection -> encode -> sign.
//!
//! Signed transactions are checked against the `bitcoin` crate, which
//! implements the same legacy wire format and sighash algorithm.

use bitcoin::address::NetworkUnchecked;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{ecdsa, Message, Secp256k1};
use bitcoin::sighash::SighashCache;
use bitcoin::{Address, Network, ScriptBuf};
use chain_utxo::{signer, ChainError, ChainParams, PublicKeyDerivation, Utxo};
use serde_json::json;
use wallet_core::*;

const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const SECRET_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const RECIPIENT: &str = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";

fn utxos_json(owner: &Wallet, entries: &[(String, u32, u64, u64)]) -> String {
    let script = mainnet_address(&owner.address().unwrap()).script_pubkey();
    let list: Vec<_> = entries
        .iter()
        .map(|(txid, index, value, confirmations)| {
            json!({
                "txid": txid,
                "outputIndex": index,
                "value": value,
                "confirmations": confirmations,
                "lockingScript": hex::encode(script.as_bytes()),
            })
        })
        .collect();
    serde_json::to_string(&list).unwrap()
}

fn mainnet_address(s: &str) -> Address {
    s.parse::<Address<NetworkUnchecked>>()
        .unwrap()
        .require_network(Network::Bitcoin)
        .unwrap()
}

/// Split a P2PKH unlocking script into its (signature, pubkey) pushes.
fn split_script_sig(script_sig: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let sig_len = script_sig[0] as usize;
    let sig = script_sig[1..1 + sig_len].to_vec();
    let pk_len = script_sig[1 + sig_len] as usize;
    let pk = script_sig[2 + sig_len..2 + sig_len + pk_len].to_vec();
    assert_eq!(script_sig.len(), 2 + sig_len + pk_len);
    (sig, pk)
}

// ─── Standard wallet: phrase -> send -> verify ──────────────────────

#[test]
fn send_verifies_under_bitcoin_consensus_rules() {
    let wallet = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    let utxos = Utxo::from_json_list(&utxos_json(
        &wallet,
        &[
            ("11".repeat(32), 0, 60_000_000, 12),
            ("22".repeat(32), 3, 70_000_000, 3),
        ],
    ))
    .unwrap();

    let unsigned = wallet.build_unsigned(&utxos, RECIPIENT, 100_000_000).unwrap();
    let unsigned_bytes = unsigned.tx.encode();
    let signed = wallet.sign(&unsigned).unwrap();

    let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(&signed.bytes).unwrap();
    assert_eq!(tx.compute_txid().to_string(), signed.txid);
    assert_eq!(tx.input.len(), 2);
    assert_eq!(tx.output.len(), 2);

    // least-confirmed first
    assert_eq!(tx.input[0].previous_output.txid.to_string(), "22".repeat(32));
    assert_eq!(tx.input[0].previous_output.vout, 3);
    assert_eq!(tx.input[1].previous_output.txid.to_string(), "11".repeat(32));
    assert!(tx.input.iter().all(|i| i.sequence.0 == 0xFFFF_FFFE));

    assert_eq!(tx.output[0].value.to_sat(), 100_000_000);
    assert_eq!(
        tx.output[0].script_pubkey,
        mainnet_address(RECIPIENT).script_pubkey()
    );
    assert_eq!(tx.output[1].value.to_sat(), 130_000_000 - 100_000_000 - signed.fee);
    assert_eq!(
        tx.output[1].script_pubkey,
        mainnet_address(&wallet.address().unwrap()).script_pubkey()
    );

    let secp = Secp256k1::verification_only();
    let cache = SighashCache::new(&tx);
    let expected_pubkey = wallet.public_key().unwrap();
    for (index, input) in tx.input.iter().enumerate() {
        let locking = ScriptBuf::from_bytes(unsigned.prevouts[index].locking_script_bytes().unwrap());
        let sighash = cache
            .legacy_signature_hash(index, locking.as_script(), 0x01)
            .unwrap()
            .to_byte_array();

        let ours = signer::signature_digest(
            &unsigned_bytes,
            index,
            locking.as_bytes(),
            wallet.params(),
        )
        .unwrap();
        assert_eq!(ours, sighash);

        let (sig, pk) = split_script_sig(input.script_sig.as_bytes());
        assert_eq!(pk, expected_pubkey.as_bytes());
        assert_eq!(*sig.last().unwrap(), 0x01);

        // from_der is strict DER and verify_ecdsa rejects high-S
        let signature = ecdsa::Signature::from_der(&sig[..sig.len() - 1]).unwrap();
        let pubkey = bitcoin::secp256k1::PublicKey::from_slice(&pk).unwrap();
        secp.verify_ecdsa(&Message::from_digest(sighash), &signature, &pubkey)
            .unwrap();
    }
}

#[test]
fn sign_hex_matches_sign() {
    let wallet = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    let utxos =
        Utxo::from_json_list(&utxos_json(&wallet, &[("ab".repeat(32), 1, 5_000_000, 1)])).unwrap();

    let unsigned = wallet.build_unsigned(&utxos, RECIPIENT, 1_000_000).unwrap();
    let via_struct = wallet.sign(&unsigned).unwrap();
    let via_hex = wallet.sign_hex(&unsigned.to_hex(), &unsigned.prevouts).unwrap();
    assert_eq!(via_struct.to_hex(), via_hex);
}

#[test]
fn exact_spend_has_no_change_output() {
    let wallet = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    // one input, two outputs: 226 bytes -> one started kilobyte -> 10_000
    let utxos =
        Utxo::from_json_list(&utxos_json(&wallet, &[("cd".repeat(32), 0, 1_010_000, 1)])).unwrap();

    let signed = wallet.send(&utxos, RECIPIENT, 1_000_000).unwrap();
    let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(&signed.bytes).unwrap();
    assert_eq!(tx.output.len(), 1);
    assert_eq!(signed.fee, 10_000);
}

#[test]
fn insufficient_funds_reports_required_and_available() {
    let wallet = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    let utxos = Utxo::from_json_list(&utxos_json(
        &wallet,
        &[("01".repeat(32), 0, 5_000, 1), ("02".repeat(32), 0, 3_000, 2)],
    ))
    .unwrap();

    let err = wallet.send(&utxos, RECIPIENT, 10_000).unwrap_err();
    assert!(matches!(
        err,
        WalletError::Chain(ChainError::InsufficientFunds {
            required: 20_000,
            available: 8_000
        })
    ));
}

#[test]
fn bad_recipient_is_rejected_before_selection() {
    let wallet = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    let err = wallet.send(&[], "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMx", 1).unwrap_err();
    assert!(matches!(err, WalletError::Chain(ChainError::InvalidAddress(_))));
}

// ─── Addresses ──────────────────────────────────────────────────────

#[test]
fn known_secret_gives_known_address() {
    let wallet =
        Wallet::from_secret_hex(SECRET_ONE, PublicKeyDerivation::Standard, ChainParams::default())
            .unwrap();
    let address = wallet.address().unwrap();
    assert_eq!(address, RECIPIENT);

    let pubkey = bitcoin::PublicKey::from_slice(wallet.public_key().unwrap().as_bytes()).unwrap();
    assert_eq!(
        mainnet_address(&address).script_pubkey(),
        ScriptBuf::new_p2pkh(&pubkey.pubkey_hash())
    );
}

#[test]
fn params_from_json_change_address_format() {
    let params = ChainParams::from_json(r#"{"address_version": 48, "address_prefix": "L"}"#).unwrap();
    assert_eq!(params.min_fee, ChainParams::default().min_fee);

    let wallet =
        Wallet::from_secret_hex(SECRET_ONE, PublicKeyDerivation::Standard, params.clone()).unwrap();
    let address = wallet.address().unwrap();
    assert!(address.starts_with('L'));
    assert!(validate_address(&address, &params));
    assert!(!validate_address(RECIPIENT, &params));
    assert!(!validate_address(&address, &ChainParams::default()));
}

// ─── Legacy wallet: imported secret -> spend ────────────────────────

#[test]
fn legacy_wallet_spends_its_outputs() {
    let legacy =
        Wallet::from_secret_hex(SECRET_ONE, PublicKeyDerivation::Legacy, ChainParams::default())
            .unwrap();
    let standard =
        Wallet::from_secret_hex(SECRET_ONE, PublicKeyDerivation::Standard, ChainParams::default())
            .unwrap();
    let utxos =
        Utxo::from_json_list(&utxos_json(&legacy, &[("ef".repeat(32), 2, 2_000_000, 4)])).unwrap();

    let unsigned = legacy.build_unsigned(&utxos, RECIPIENT, 500_000).unwrap();
    let signed = legacy.sign(&unsigned).unwrap();
    let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(&signed.bytes).unwrap();

    let (sig, pk) = split_script_sig(tx.input[0].script_sig.as_bytes());
    assert_eq!(pk, legacy.public_key().unwrap().as_bytes());

    // the signature itself is made with the secret scalar
    let locking = ScriptBuf::from_bytes(utxos[0].locking_script_bytes().unwrap());
    let sighash = SighashCache::new(&tx)
        .legacy_signature_hash(0, locking.as_script(), 0x01)
        .unwrap()
        .to_byte_array();
    let signature = ecdsa::Signature::from_der(&sig[..sig.len() - 1]).unwrap();
    let pubkey =
        bitcoin::secp256k1::PublicKey::from_slice(standard.public_key().unwrap().as_bytes()).unwrap();
    Secp256k1::verification_only()
        .verify_ecdsa(&Message::from_digest(sighash), &signature, &pubkey)
        .unwrap();
}

#[test]
fn wrong_wallet_cannot_sign() {
    let owner = Wallet::from_mnemonic(TEST_MNEMONIC, ChainParams::default()).unwrap();
    let other =
        Wallet::from_secret_hex(SECRET_ONE, PublicKeyDerivation::Standard, ChainParams::default())
            .unwrap();
    let utxos =
        Utxo::from_json_list(&utxos_json(&owner, &[("aa".repeat(32), 0, 2_000_000, 1)])).unwrap();

    let unsigned = owner.build_unsigned(&utxos, RECIPIENT, 500_000).unwrap();
    assert!(matches!(
        other.sign(&unsigned),
        Err(WalletError::Chain(ChainError::KeyMismatch { .. }))
    ));
}
