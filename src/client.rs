//! Unified RPC client over any transport.
//!
//! # Responsibilities
//! - Submit signed transactions and pre-execute unsigned ones
//! - Offer one typed method per node query
//! - Stay identical whichever transport it wraps
//!
//! # Design Decisions
//! - Holds `Arc<dyn Transport>`; switching transports changes no caller code
//! - Typed decoding happens here, at the edge, via `Envelope::decode`
//! - Never retries; errors carry `is_retryable` for the caller

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{RestConfig, WebSocketConfig};
use crate::crypto::Address;
use crate::error::{ClientError, Result};
use crate::response::{
    Amount, Balance, BlockJson, BlockTransactions, Envelope, MerkleProof, PreExecResult,
    SmartContractEvent,
};
use crate::transaction::asset::Asset;
use crate::transaction::{SignedTransaction, Transaction, TxHash, UnsignedTransaction};
use crate::transport::{
    BlockRef, Method, RestTransport, Transport, TransportKind, WebSocketTransport,
};

/// Client for one node.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client over the REST API.
    pub fn rest(config: RestConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(RestTransport::new(config)?)))
    }

    /// Client over a connected WebSocket.
    pub async fn websocket(config: WebSocketConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(WebSocketTransport::connect(config).await?)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Submit already-encoded transaction bytes.
    pub async fn send_raw_transaction(&self, raw: &[u8], pre_execute: bool, full_response: bool) -> Result<Envelope> {
        self.transport.submit(raw, pre_execute, full_response).await
    }

    /// Commit a signed transaction.
    ///
    /// Without `full_response` a success carries the transaction hash; with
    /// it, the execution event.
    pub async fn send_transaction(&self, tx: &SignedTransaction, full_response: bool) -> Result<Envelope> {
        let raw = tx.serialize()?;
        tracing::info!(
            tx_hash = %tx.hash(),
            transport = %self.kind(),
            full_response,
            "Submitting transaction"
        );
        self.transport.submit(&raw, false, full_response).await
    }

    /// Simulate a transaction against current state without committing it.
    ///
    /// The result is a best-effort view: a later commit may observe
    /// different state.
    pub async fn pre_execute(&self, tx: &UnsignedTransaction) -> Result<Envelope<PreExecResult>> {
        let raw = tx.serialize()?;
        self.transport
            .submit(&raw, true, false)
            .await?
            .decode("sendrawtransaction")
    }

    async fn query_as<T: DeserializeOwned>(&self, method: Method) -> Result<Envelope<T>> {
        self.transport.query(&method).await?.decode(method.action())
    }

    async fn query_hex(&self, method: Method) -> Result<Envelope<Vec<u8>>> {
        let action = method.action();
        match self.query_as::<String>(method).await? {
            Envelope::Found(text) => hex::decode(&text)
                .map(Envelope::Found)
                .map_err(|e| ClientError::Decode {
                    method: action.to_string(),
                    reason: e.to_string(),
                }),
            Envelope::NotFound => Ok(Envelope::NotFound),
            Envelope::Failed(e) => Ok(Envelope::Failed(e)),
        }
    }

    /// Transaction decoded from its wire encoding.
    pub async fn get_raw_transaction(&self, hash: TxHash) -> Result<Envelope<Transaction>> {
        match self.query_hex(Method::RawTransaction { hash, raw: true }).await? {
            Envelope::Found(bytes) => Ok(Envelope::Found(Transaction::deserialize(&bytes)?)),
            Envelope::NotFound => Ok(Envelope::NotFound),
            Envelope::Failed(e) => Ok(Envelope::Failed(e)),
        }
    }

    pub async fn get_transaction_json(&self, hash: TxHash) -> Result<Envelope<Value>> {
        self.query_as(Method::RawTransaction { hash, raw: false }).await
    }

    /// Block wire encoding.
    pub async fn get_block(&self, by: BlockRef) -> Result<Envelope<Vec<u8>>> {
        self.query_hex(Method::Block { by, raw: true }).await
    }

    pub async fn get_block_json(&self, by: BlockRef) -> Result<Envelope<BlockJson>> {
        self.query_as(Method::Block { by, raw: false }).await
    }

    pub async fn get_block_height(&self) -> Result<Envelope<u32>> {
        self.query_as(Method::BlockHeight).await
    }

    pub async fn get_block_txs_by_height(&self, height: u32) -> Result<Envelope<BlockTransactions>> {
        self.query_as(Method::BlockTxsByHeight { height }).await
    }

    pub async fn get_balance(&self, address: Address) -> Result<Envelope<Balance>> {
        self.query_as(Method::Balance { address }).await
    }

    /// Deployed code of a contract.
    pub async fn get_contract(&self, hash: Address) -> Result<Envelope<Vec<u8>>> {
        self.query_hex(Method::Contract { hash, raw: true }).await
    }

    pub async fn get_contract_json(&self, hash: Address) -> Result<Envelope<Value>> {
        self.query_as(Method::Contract { hash, raw: false }).await
    }

    pub async fn get_smart_code_event(&self, hash: TxHash) -> Result<Envelope<SmartContractEvent>> {
        self.query_as(Method::SmartCodeEventByHash { hash }).await
    }

    pub async fn get_smart_code_events_by_height(&self, height: u32) -> Result<Envelope<Vec<SmartContractEvent>>> {
        self.query_as(Method::SmartCodeEventByHeight { height }).await
    }

    pub async fn get_block_height_by_tx_hash(&self, hash: TxHash) -> Result<Envelope<u32>> {
        self.query_as(Method::BlockHeightByTxHash { hash }).await
    }

    /// Raw value stored under `key` by `contract`.
    pub async fn get_storage(&self, contract: Address, key: &[u8]) -> Result<Envelope<Vec<u8>>> {
        self.query_hex(Method::Storage {
            contract,
            key: key.to_vec(),
        })
        .await
    }

    pub async fn get_merkle_proof(&self, hash: TxHash) -> Result<Envelope<MerkleProof>> {
        self.query_as(Method::MerkleProof { hash }).await
    }

    pub async fn get_node_count(&self) -> Result<Envelope<u32>> {
        self.query_as(Method::NodeCount).await
    }

    pub async fn get_generate_block_time(&self) -> Result<Envelope<u32>> {
        self.query_as(Method::GenerateBlockTime).await
    }

    pub async fn get_gas_price(&self) -> Result<Envelope<Value>> {
        self.query_as(Method::GasPrice).await
    }

    pub async fn get_version(&self) -> Result<Envelope<String>> {
        self.query_as(Method::Version).await
    }

    pub async fn get_network_id(&self) -> Result<Envelope<u32>> {
        self.query_as(Method::NetworkId).await
    }

    pub async fn get_mempool_tx_count(&self) -> Result<Envelope<Value>> {
        self.query_as(Method::MempoolTxCount).await
    }

    pub async fn get_mempool_tx_state(&self, hash: TxHash) -> Result<Envelope<Value>> {
        self.query_as(Method::MempoolTxState { hash }).await
    }

    /// ONG claimable by `address`.
    pub async fn get_unbound_ong(&self, address: Address) -> Result<Envelope<u64>> {
        Ok(self
            .query_as::<Amount>(Method::UnboundOng { address })
            .await?
            .map(|a| a.0))
    }

    pub async fn get_grant_ong(&self, address: Address) -> Result<Envelope<u64>> {
        Ok(self
            .query_as::<Amount>(Method::GrantOng { address })
            .await?
            .map(|a| a.0))
    }

    pub async fn get_allowance(&self, asset: Asset, from: Address, to: Address) -> Result<Envelope<u64>> {
        Ok(self
            .query_as::<Amount>(Method::Allowance { asset, from, to })
            .await?
            .map(|a| a.0))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("transport", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::NodeError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every call with one canned envelope and records the calls.
    struct StaticTransport {
        answer: Envelope,
        calls: Mutex<Vec<String>>,
    }

    impl StaticTransport {
        fn new(answer: Envelope) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn submit(&self, raw: &[u8], pre_execute: bool, full_response: bool) -> Result<Envelope> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("submit:{}:{}:{}", raw.len(), pre_execute, full_response));
            Ok(self.answer.clone())
        }

        async fn query(&self, method: &Method) -> Result<Envelope> {
            self.calls.lock().unwrap().push(method.action().to_string());
            Ok(self.answer.clone())
        }

        fn kind(&self) -> TransportKind {
            TransportKind::Rest
        }
    }

    #[tokio::test]
    async fn test_typed_query() {
        let transport = StaticTransport::new(Envelope::Found(json!(321)));
        let client = RpcClient::new(transport.clone());
        assert_eq!(client.get_block_height().await.unwrap(), Envelope::Found(321));
        assert_eq!(transport.calls.lock().unwrap().as_slice(), ["getblockheight"]);
    }

    #[tokio::test]
    async fn test_not_found_passes_through() {
        let client = RpcClient::new(StaticTransport::new(Envelope::NotFound));
        let proof = client.get_merkle_proof(TxHash::new([1; 32])).await.unwrap();
        assert!(proof.is_not_found());
    }

    #[tokio::test]
    async fn test_node_error_passes_through() {
        let error = NodeError {
            action: "getstorage".into(),
            code: 42002,
            desc: "INVALID PARAMS".into(),
            result: Value::Null,
        };
        let client = RpcClient::new(StaticTransport::new(Envelope::Failed(error.clone())));
        let result = client.get_storage(Address::native(1), b"k").await.unwrap();
        assert_eq!(result, Envelope::Failed(error));
    }

    #[tokio::test]
    async fn test_hex_decode_failure_names_method() {
        let client = RpcClient::new(StaticTransport::new(Envelope::Found(json!("zz"))));
        let err = client.get_contract(Address::native(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref method, .. } if method == "getcontract"));
    }

    #[tokio::test]
    async fn test_amount_queries() {
        let client = RpcClient::new(StaticTransport::new(Envelope::Found(json!("1500"))));
        let amount = client.get_unbound_ong(Address::native(5)).await.unwrap();
        assert_eq!(amount, Envelope::Found(1500));
    }

    #[tokio::test]
    async fn test_pre_execute_sends_unsigned_bytes() {
        let transport = StaticTransport::new(Envelope::Found(json!({"State": 1, "Gas": 20000, "Result": "01"})));
        let client = RpcClient::new(transport.clone());
        let tx = crate::transaction::make_invoke(vec![0x51], 0, 0, None);
        let raw_len = tx.serialize().unwrap().len();

        let result = client.pre_execute(&tx).await.unwrap();
        assert!(result.found().unwrap().succeeded());
        assert_eq!(
            transport.calls.lock().unwrap().as_slice(),
            [format!("submit:{}:true:false", raw_len)]
        );
    }
}
