use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChainError;
use crate::params::ChainParams;

/// Estimated bytes per P2PKH input: outpoint(36) + scriptSig(~107) + sequence(4) + overhead.
pub const INPUT_BYTES: u64 = 148;
/// Estimated bytes per P2PKH output: value(8) + script length(1) + script(25).
pub const OUTPUT_BYTES: u64 = 34;
/// Fixed overhead: version(4) + locktime(4) + input/output counts.
pub const TX_OVERHEAD_BYTES: u64 = 10;

/// Outputs assumed while selecting: the spend plus a change output.
const SELECTION_OUTPUTS: usize = 2;

/// A spendable output as reported by the network client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub output_index: u32,
    /// Value in minor units.
    pub value: u64,
    pub confirmations: u64,
    /// The locking script (scriptPubKey) as hex, when the client supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locking_script: Option<String>,
}

impl Utxo {
    /// Parse the collaborator's JSON array of UTXOs.
    pub fn from_json_list(json: &str) -> Result<Vec<Utxo>, ChainError> {
        serde_json::from_str(json)
            .map_err(|e| ChainError::InvalidUtxo(format!("failed to parse utxo list: {e}")))
    }

    /// `txid:index`, used in logs and error messages.
    pub fn outpoint(&self) -> String {
        format!("{}:{}", self.txid, self.output_index)
    }

    /// Decode the locking script, failing if it is absent or not hex.
    pub fn locking_script_bytes(&self) -> Result<Vec<u8>, ChainError> {
        let script_hex = self
            .locking_script
            .as_deref()
            .ok_or_else(|| ChainError::MissingLockingScript(self.outpoint()))?;
        hex::decode(script_hex).map_err(|e| {
            ChainError::InvalidUtxo(format!("locking script of {} is not hex: {e}", self.outpoint()))
        })
    }
}

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
    /// Selected UTXOs, in spending order.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs.
    pub total: u64,
    /// Fee for the selected inputs and two outputs.
    pub fee: u64,
    /// `total - amount - fee`; zero means no change output.
    pub change: u64,
}

/// Estimated serialized size of a P2PKH transaction.
pub fn estimate_size(num_inputs: usize, num_outputs: usize) -> u64 {
    TX_OVERHEAD_BYTES + (num_inputs as u64 * INPUT_BYTES) + (num_outputs as u64 * OUTPUT_BYTES)
}

/// Estimate the fee: every started kilobyte costs `fee_per_kb`, floored at `min_fee`.
pub fn estimate_fee(num_inputs: usize, num_outputs: usize, params: &ChainParams) -> u64 {
    let kilobytes = estimate_size(num_inputs, num_outputs).div_ceil(1000);
    params
        .min_fee
        .max(kilobytes.saturating_mul(params.fee_per_kb))
}

/// Select UTXOs to cover `amount` plus the estimated fee.
///
/// UTXOs are taken least-confirmed first (stable for equal confirmation
/// counts) and the fee is re-estimated after each addition because it grows
/// with the input count. Nothing is returned unless the whole target is met.
pub fn select_utxos(
    utxos: &[Utxo],
    amount: u64,
    params: &ChainParams,
) -> Result<CoinSelection, ChainError> {
    if amount == 0 {
        return Err(ChainError::InvalidAmount("amount must be non-zero".into()));
    }

    let mut seen = HashSet::with_capacity(utxos.len());
    for utxo in utxos {
        if !seen.insert((utxo.txid.to_ascii_lowercase(), utxo.output_index)) {
            return Err(ChainError::InvalidUtxo(format!(
                "duplicate outpoint {}",
                utxo.outpoint()
            )));
        }
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by_key(|utxo| utxo.confirmations);

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total: u64 = 0;

    for utxo in sorted {
        selected.push(utxo.clone());
        total = total.saturating_add(utxo.value);

        let fee = estimate_fee(selected.len(), SELECTION_OUTPUTS, params);
        let required = amount.saturating_add(fee);
        if total >= required {
            let change = total - required;
            debug!(
                inputs = selected.len(),
                total,
                fee,
                change,
                "selected utxos"
            );
            return Ok(CoinSelection {
                selected,
                total,
                fee,
                change,
            });
        }
    }

    let fee = estimate_fee(selected.len(), SELECTION_OUTPUTS, params);
    Err(ChainError::InsufficientFunds {
        required: amount.saturating_add(fee),
        available: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_utxo(txid: &str, output_index: u32, value: u64, confirmations: u64) -> Utxo {
        Utxo {
            txid: txid.to_string(),
            output_index,
            value,
            confirmations,
            locking_script: None,
        }
    }

    fn cheap_params() -> ChainParams {
        ChainParams {
            min_fee: 1_000,
            fee_per_kb: 1_000,
            ..ChainParams::default()
        }
    }

    #[test]
    fn duplicate_outpoints_rejected() {
        let params = ChainParams::default();
        let txid = "aa".repeat(32);
        let utxos = vec![
            make_utxo(&txid, 0, 30_000, 1),
            make_utxo(&txid.to_uppercase(), 0, 30_000, 2),
        ];
        assert!(matches!(
            select_utxos(&utxos, 40_000, &params),
            Err(ChainError::InvalidUtxo(_))
        ));

        let distinct = vec![make_utxo(&txid, 0, 30_000, 1), make_utxo(&txid, 1, 30_000, 2)];
        assert_eq!(select_utxos(&distinct, 40_000, &params).unwrap().selected.len(), 2);
    }

    #[test]
    fn estimate_size_one_in_two_out() {
        assert_eq!(estimate_size(1, 2), 226);
    }

    #[test]
    fn estimate_fee_rounds_up_per_kilobyte() {
        let params = ChainParams {
            min_fee: 0,
            fee_per_kb: 1_000,
            ..ChainParams::default()
        };
        // 226 bytes -> 1 kB
        assert_eq!(estimate_fee(1, 2, &params), 1_000);
        // 10 + 7*148 + 68 = 1114 bytes -> 2 kB
        assert_eq!(estimate_fee(7, 2, &params), 2_000);
    }

    #[test]
    fn estimate_fee_respects_minimum() {
        let params = ChainParams {
            min_fee: 50_000,
            fee_per_kb: 1_000,
            ..ChainParams::default()
        };
        assert_eq!(estimate_fee(1, 2, &params), 50_000);
    }

    #[test]
    fn selects_least_confirmed_first() {
        let utxos = vec![
            make_utxo("old", 0, 100_000, 500),
            make_utxo("new", 0, 100_000, 1),
            make_utxo("mid", 0, 100_000, 20),
        ];
        let selection = select_utxos(&utxos, 10_000, &cheap_params()).unwrap();
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].txid, "new");
    }

    #[test]
    fn equal_confirmations_keep_input_order() {
        let utxos = vec![
            make_utxo("first", 0, 5_000, 3),
            make_utxo("second", 0, 5_000, 3),
            make_utxo("third", 0, 5_000, 3),
        ];
        let selection = select_utxos(&utxos, 8_000, &cheap_params()).unwrap();
        let order: Vec<&str> = selection.selected.iter().map(|u| u.txid.as_str()).collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn fee_recomputed_as_inputs_grow() {
        // Each input adds 148 bytes; the seventh input pushes the estimate over 1 kB.
        let params = ChainParams {
            min_fee: 0,
            fee_per_kb: 10_000,
            ..ChainParams::default()
        };
        let utxos: Vec<Utxo> = (0..8)
            .map(|i| make_utxo(&format!("tx{i}"), i, 10_000, i as u64))
            .collect();
        let selection = select_utxos(&utxos, 55_000, &params).unwrap();
        assert_eq!(selection.fee, estimate_fee(selection.selected.len(), 2, &params));
        assert!(selection.total >= 55_000 + selection.fee);
        // 10 + 7*148 + 68 = 1114 bytes -> 2 kB -> 20_000 fee, needs 75_000 -> 8 inputs
        assert_eq!(selection.selected.len(), 8);
        assert_eq!(selection.fee, 20_000);
        assert_eq!(selection.change, 5_000);
    }

    #[test]
    fn exact_cover_has_zero_change() {
        let params = cheap_params();
        let utxos = vec![make_utxo("aaaa", 0, 51_000, 1)];
        let selection = select_utxos(&utxos, 50_000, &params).unwrap();
        assert_eq!(selection.fee, 1_000);
        assert_eq!(selection.change, 0);
    }

    #[test]
    fn insufficient_funds_reports_totals() {
        let params = cheap_params();
        let utxos = vec![make_utxo("aaaa", 0, 1_000, 5), make_utxo("bbbb", 1, 2_000, 6)];
        match select_utxos(&utxos, 500_000, &params) {
            Err(ChainError::InsufficientFunds { required, available }) => {
                assert_eq!(required, 500_000 + estimate_fee(2, 2, &params));
                assert_eq!(available, 3_000);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
    }

    #[test]
    fn empty_set_is_insufficient() {
        let params = cheap_params();
        match select_utxos(&[], 1_000, &params) {
            Err(ChainError::InsufficientFunds { required, available }) => {
                assert_eq!(required, 1_000 + params.min_fee);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
    }

    #[test]
    fn zero_amount_rejected() {
        let utxos = vec![make_utxo("aaaa", 0, 100_000, 1)];
        assert!(matches!(
            select_utxos(&utxos, 0, &cheap_params()),
            Err(ChainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn selection_is_idempotent() {
        let utxos: Vec<Utxo> = (0..20)
            .map(|i| make_utxo(&format!("{i:064x}"), i, 7_000 + i as u64 * 13, (i % 4) as u64))
            .collect();
        let first = select_utxos(&utxos, 60_000, &cheap_params()).unwrap();
        for _ in 0..5 {
            assert_eq!(select_utxos(&utxos, 60_000, &cheap_params()).unwrap(), first);
        }
    }

    #[test]
    fn json_list_parses_collaborator_shape() {
        let json = r#"[
            {"txid": "ab", "outputIndex": 1, "value": 100000000, "confirmations": 10,
             "lockingScript": "76a914000000000000000000000000000000000000000088ac"},
            {"txid": "cd", "outputIndex": 0, "value": 5, "confirmations": 0}
        ]"#;
        let utxos = Utxo::from_json_list(json).unwrap();
        assert_eq!(utxos.len(), 2);
        assert_eq!(utxos[0].output_index, 1);
        assert_eq!(utxos[0].value, 100_000_000);
        assert_eq!(utxos[0].locking_script_bytes().unwrap().len(), 25);
        assert!(matches!(
            utxos[1].locking_script_bytes(),
            Err(ChainError::MissingLockingScript(_))
        ));
    }

    #[test]
    fn json_list_rejects_negative_values() {
        let json = r#"[{"txid": "ab", "outputIndex": 0, "value": -1, "confirmations": 1}]"#;
        assert!(matches!(
            Utxo::from_json_list(json),
            Err(ChainError::InvalidUtxo(_))
        ));
    }
}
