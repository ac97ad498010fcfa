//! Typed results decoded from `Envelope<Value>` payloads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept amounts the node prints either as JSON numbers or decimal strings.
fn u64_from_str_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("{} is not a u64", n))),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected an amount, got {}", other))),
    }
}

/// A token amount, printed by the node as a number or a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Amount(#[serde(deserialize_with = "u64_from_str_or_number")] pub u64);

/// ONT and ONG balance of one address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Balance {
    #[serde(deserialize_with = "u64_from_str_or_number")]
    pub ont: u64,
    #[serde(deserialize_with = "u64_from_str_or_number")]
    pub ong: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockHeader {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub prev_block_hash: String,
    #[serde(default)]
    pub transactions_root: String,
    #[serde(default)]
    pub block_root: String,
    #[serde(default)]
    pub timestamp: u32,
    pub height: u32,
    #[serde(default)]
    pub consensus_data: u64,
    #[serde(default)]
    pub next_bookkeeper: String,
    #[serde(default)]
    pub hash: String,
}

/// A block in the node's JSON form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockJson {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
    pub header: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<Value>,
}

/// Transaction hashes included at one height.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockTransactions {
    pub hash: String,
    pub height: u32,
    #[serde(default)]
    pub transactions: Vec<String>,
}

/// Inclusion proof of a transaction against a later block root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MerkleProof {
    #[serde(default, rename = "Type")]
    pub proof_type: String,
    pub transactions_root: String,
    pub block_height: u32,
    pub cur_block_root: String,
    pub cur_block_height: u32,
    #[serde(default)]
    pub target_hashes: Vec<String>,
}

/// One notification emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotifyEvent {
    pub contract_address: String,
    #[serde(default)]
    pub states: Value,
}

/// Execution record of a committed transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SmartContractEvent {
    pub tx_hash: String,
    /// 1 on success, 0 on failure.
    pub state: u8,
    #[serde(default)]
    pub gas_consumed: u64,
    #[serde(default)]
    pub notify: Vec<NotifyEvent>,
}

impl SmartContractEvent {
    pub fn succeeded(&self) -> bool {
        self.state == 1
    }
}

/// Result of simulating a transaction without committing it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreExecResult {
    pub state: u8,
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub notify: Vec<NotifyEvent>,
}

impl PreExecResult {
    pub fn succeeded(&self) -> bool {
        self.state == 1
    }

    /// The returned value when the contract produced a single byte string.
    pub fn result_bytes(&self) -> Option<Vec<u8>> {
        self.result.as_str().and_then(|s| hex::decode(s).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_balance_accepts_strings_and_numbers() {
        let balance: Balance = serde_json::from_value(json!({"ont": "10", "ong": 25})).unwrap();
        assert_eq!(balance, Balance { ont: 10, ong: 25 });
        assert!(serde_json::from_value::<Balance>(json!({"ont": "x", "ong": 0})).is_err());
    }

    #[test]
    fn test_amount() {
        assert_eq!(serde_json::from_value::<Amount>(json!("42")).unwrap(), Amount(42));
        assert_eq!(serde_json::from_value::<Amount>(json!(7)).unwrap(), Amount(7));
    }

    #[test]
    fn test_block_json() {
        let block: BlockJson = serde_json::from_value(json!({
            "Hash": "ab",
            "Size": 100,
            "Header": {"Version": 0, "PrevBlockHash": "00", "Height": 7, "Timestamp": 1},
            "Transactions": [{"Hash": "cd"}]
        }))
        .unwrap();
        assert_eq!(block.header.height, 7);
        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn test_event_and_pre_exec() {
        let event: SmartContractEvent = serde_json::from_value(json!({
            "TxHash": "ff",
            "State": 1,
            "GasConsumed": 20000,
            "Notify": [{"ContractAddress": "0300000000000000000000000000000000000000", "States": ["Register"]}]
        }))
        .unwrap();
        assert!(event.succeeded());
        assert_eq!(event.notify[0].states, json!(["Register"]));

        let pre: PreExecResult =
            serde_json::from_value(json!({"State": 1, "Gas": 20000, "Result": "0102"})).unwrap();
        assert_eq!(pre.result_bytes(), Some(vec![1, 2]));
    }

    #[test]
    fn test_merkle_proof() {
        let proof: MerkleProof = serde_json::from_value(json!({
            "Type": "MerkleProof",
            "TransactionsRoot": "aa",
            "BlockHeight": 5,
            "CurBlockRoot": "bb",
            "CurBlockHeight": 9,
            "TargetHashes": ["cc", "dd"]
        }))
        .unwrap();
        assert_eq!(proof.proof_type, "MerkleProof");
        assert_eq!(proof.target_hashes.len(), 2);
    }
}
