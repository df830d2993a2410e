//! Legacy transaction wire format.
//!
//! ```text
//! version u32 | varint n_in | inputs | varint n_out | outputs | locktime u32
//! input  = prev txid (32, internal order) | prev index u32 | varint len | script | sequence u32
//! output = value u64 | varint len | script
//! ```
//! All integers are little-endian.

use crypto_utils::hash::double_sha256;

use crate::address;
use crate::error::ChainError;
use crate::params::ChainParams;
use crate::script::p2pkh_script;
use crate::utxo::{self, CoinSelection, Utxo};
use crate::varint::{read_varint, varint_len, write_varint};

/// Outpoint (36) plus sequence (4): the fixed part of every input.
const INPUT_FIXED_BYTES: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Previous transaction hash (32 bytes, internal byte order).
    pub prev_txid: [u8; 32],
    pub prev_index: u32,
    /// Unlocking script; empty until signed.
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    /// Pay `value` to a validated P2PKH address.
    pub fn to_address(address: &str, value: u64, params: &ChainParams) -> Result<Self, ChainError> {
        let hash = address::address_to_hash160(address, params)?;
        Ok(Self {
            value,
            script_pubkey: p2pkh_script(&hash),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// `true` when no input carries a script yet.
    pub fn is_unsigned(&self) -> bool {
        self.inputs.iter().all(|input| input.script_sig.is_empty())
    }

    /// `true` when every input carries a script.
    pub fn is_signed(&self) -> bool {
        !self.inputs.is_empty() && self.inputs.iter().all(|input| !input.script_sig.is_empty())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            write_input(&mut buf, input, &input.script_sig);
        }
        write_outputs(&mut buf, &self.outputs);
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
        buf
    }

    /// Lowercase hex of [`Transaction::encode`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    /// Exact size of [`Transaction::encode`].
    pub fn encoded_len(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| INPUT_FIXED_BYTES + varint_len(i.script_sig.len() as u64) + i.script_sig.len())
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + varint_len(o.script_pubkey.len() as u64) + o.script_pubkey.len())
            .sum();
        4 + varint_len(self.inputs.len() as u64)
            + inputs
            + varint_len(self.outputs.len() as u64)
            + outputs
            + 4
    }

    /// Parse a complete serialized transaction. Trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, ChainError> {
        let mut reader = Reader::new(bytes);

        let version = reader.read_u32()?;

        let input_count = reader.read_varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let mut prev_txid = [0u8; 32];
            prev_txid.copy_from_slice(reader.take(32)?);
            let prev_index = reader.read_u32()?;
            let script_len = reader.read_len()?;
            let script_sig = reader.take(script_len)?.to_vec();
            let sequence = reader.read_u32()?;
            inputs.push(TxInput {
                prev_txid,
                prev_index,
                script_sig,
                sequence,
            });
        }

        let output_count = reader.read_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let value = reader.read_u64()?;
            let script_len = reader.read_len()?;
            let script_pubkey = reader.take(script_len)?.to_vec();
            outputs.push(TxOutput {
                value,
                script_pubkey,
            });
        }

        let lock_time = reader.read_u32()?;
        reader.finish()?;

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Parse lowercase or uppercase transaction hex.
    pub fn from_hex(tx_hex: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(tx_hex.trim())
            .map_err(|e| ChainError::MalformedTransactionHex(format!("invalid hex: {e}")))?;
        Self::decode(&bytes)
    }

    /// Transaction id in display order.
    pub fn txid(&self) -> String {
        txid(&self.encode())
    }
}

/// Display-order txid of serialized transaction bytes.
pub fn txid(bytes: &[u8]) -> String {
    let mut hash = double_sha256(bytes);
    hash.reverse();
    hex::encode(hash)
}

/// Serialize one input with `script` in its script field.
pub(crate) fn write_input(buf: &mut Vec<u8>, input: &TxInput, script: &[u8]) {
    buf.extend_from_slice(&input.prev_txid);
    buf.extend_from_slice(&input.prev_index.to_le_bytes());
    write_varint(buf, script.len() as u64);
    buf.extend_from_slice(script);
    buf.extend_from_slice(&input.sequence.to_le_bytes());
}

fn write_outputs(buf: &mut Vec<u8>, outputs: &[TxOutput]) {
    write_varint(buf, outputs.len() as u64);
    for output in outputs {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_varint(buf, output.script_pubkey.len() as u64);
        buf.extend_from_slice(&output.script_pubkey);
    }
}

/// Locate the byte offset of the output-count varint.
///
/// Walks the version, the input-count varint and `input_count` inputs,
/// skipping each script by its varint length prefix (1, 3, 5 or 9 bytes).
pub fn find_outputs_offset(bytes: &[u8], input_count: usize) -> Result<usize, ChainError> {
    let mut reader = Reader::new(bytes);
    reader.take(4)?;

    let declared = reader.read_varint()?;
    if declared != input_count as u64 {
        return Err(ChainError::MalformedTransactionHex(format!(
            "expected {input_count} inputs, transaction declares {declared}"
        )));
    }

    for _ in 0..input_count {
        reader.take(36)?;
        let script_len = reader.read_len()?;
        reader.take(script_len)?;
        reader.take(4)?;
    }

    if reader.remaining() == 0 {
        return Err(ChainError::MalformedTransactionHex(
            "no output section after inputs".into(),
        ));
    }
    Ok(reader.position())
}

/// Parse a hex txid string (big-endian display) to internal byte order (little-endian).
pub fn parse_txid(txid_hex: &str) -> Result<[u8; 32], ChainError> {
    let bytes =
        hex::decode(txid_hex).map_err(|e| ChainError::InvalidTxid(format!("invalid txid hex: {e}")))?;
    let mut result: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ChainError::InvalidTxid(format!("txid must be 32 bytes, got {}", bytes.len()))
    })?;
    result.reverse();
    Ok(result)
}

/// An unsigned transaction together with the UTXOs its inputs spend.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub tx: Transaction,
    /// Spent UTXOs, in input order. Needed for the signature preimages.
    pub prevouts: Vec<Utxo>,
    pub fee: u64,
}

impl UnsignedTransaction {
    pub fn to_hex(&self) -> String {
        self.tx.to_hex()
    }
}

/// Turn a coin selection into an unsigned transaction.
///
/// Emits one input per selected UTXO, the spend output, and a change output
/// only when the change is non-zero.
pub fn build_from_selection(
    selection: CoinSelection,
    recipient: &str,
    amount: u64,
    change_address: &str,
    params: &ChainParams,
) -> Result<UnsignedTransaction, ChainError> {
    let mut outputs = vec![TxOutput::to_address(recipient, amount, params)?];
    if selection.change > 0 {
        outputs.push(TxOutput::to_address(change_address, selection.change, params)?);
    } else {
        // Checked even when no change output is emitted.
        address::address_to_hash160(change_address, params)?;
    }

    let inputs = selection
        .selected
        .iter()
        .map(|utxo| {
            Ok(TxInput {
                prev_txid: parse_txid(&utxo.txid)?,
                prev_index: utxo.output_index,
                script_sig: Vec::new(),
                sequence: params.sequence,
            })
        })
        .collect::<Result<Vec<_>, ChainError>>()?;

    Ok(UnsignedTransaction {
        tx: Transaction {
            version: params.tx_version,
            inputs,
            outputs,
            lock_time: params.lock_time,
        },
        prevouts: selection.selected,
        fee: selection.fee,
    })
}

/// Select UTXOs and build the unsigned transaction paying `amount` to `recipient`.
pub fn build_unsigned_transaction(
    utxos: &[Utxo],
    recipient: &str,
    amount: u64,
    change_address: &str,
    params: &ChainParams,
) -> Result<UnsignedTransaction, ChainError> {
    // Fail on bad addresses before spending effort on selection.
    address::address_to_hash160(recipient, params)?;
    address::address_to_hash160(change_address, params)?;

    let selection = utxo::select_utxos(utxos, amount, params)?;
    build_from_selection(selection, recipient, amount, change_address, params)
}

/// Bounds-checked forward cursor over serialized bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ChainError> {
        if n > self.remaining() {
            return Err(ChainError::MalformedTransactionHex(format!(
                "need {n} bytes at offset {}, only {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, ChainError> {
        let mut le = [0u8; 4];
        le.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(le))
    }

    fn read_u64(&mut self) -> Result<u64, ChainError> {
        let mut le = [0u8; 8];
        le.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(le))
    }

    fn read_varint(&mut self) -> Result<u64, ChainError> {
        let (value, used) = read_varint(self.bytes, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// A varint length that must fit in the remaining buffer.
    fn read_len(&mut self) -> Result<usize, ChainError> {
        let at = self.pos;
        let len = self.read_varint()?;
        usize::try_from(len)
            .ok()
            .filter(|&len| len <= self.remaining())
            .ok_or_else(|| {
                ChainError::MalformedTransactionHex(format!(
                    "length {len} at offset {at} overruns the buffer"
                ))
            })
    }

    fn finish(&self) -> Result<(), ChainError> {
        if self.remaining() != 0 {
            return Err(ChainError::MalformedTransactionHex(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
