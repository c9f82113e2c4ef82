// JSON-RPC transport layer implementation
// This file implements the JSON-RPC client and the two chain flavours built on it:
// an account-model chain with simulate/send/confirm, and an EVM chain used for
// receipts and read-only contract queries

use crate::errors::RpcError;
use crate::execution::transaction::Transaction;
use crate::message::{keccak256, LogEntry, TransactionReceipt};
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::transport::{BlockRef, ChainRpc, ConfirmResult, SimulationResult};
use crate::types::{ChainId, TokenId};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct JsonRpc {
    http: Client,
    url: Url,
    service: &'static str,
}

impl JsonRpc {
    pub fn new(url: Url, service: &'static str) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| RpcError::Transport(format!("build http client: {e}")))?;
        Ok(Self { http, url, service })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let _timer = REQ_LATENCY
            .with_label_values(&[self.service, method])
            .start_timer();
        let result = self.call_inner(method, params).await;
        if result.is_err() {
            REQ_ERRORS.with_label_values(&[self.service, method]).inc();
        }
        result
    }

    async fn call_inner<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} send: {e}")))?;
        if !resp.status().is_success() {
            return Err(RpcError::Provider(format!("{method}: http {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} json parse: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(RpcError::Provider(format!("{method}: {err}")));
        }
        serde_json::from_value(body["result"].clone())
            .map_err(|e| RpcError::Provider(format!("{method} decode result: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct Contextual<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateValue {
    err: Option<Value>,
    logs: Option<Vec<String>>,
    units_consumed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: Option<u64>,
    err: Option<Value>,
    confirmation_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    prioritization_fee: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ConfirmedTransaction {
    slot: Option<u64>,
    meta: Option<TransactionMeta>,
}

/// Rank of a commitment level; higher is more final.
fn commitment_rank(level: &str) -> u8 {
    match level {
        "processed" => 0,
        "confirmed" => 1,
        "finalized" => 2,
        _ => 0,
    }
}

/// Account-model chain: simulate, send-raw, signature-status confirmation and
/// block-height expiry.
#[derive(Debug, Clone)]
pub struct SolanaRpc {
    rpc: JsonRpc,
    chain: ChainId,
    commitment: String,
    poll_interval: Duration,
}

impl SolanaRpc {
    pub fn new(url: Url, chain: ChainId) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpc::new(url, "solana")?,
            chain,
            commitment: "finalized".to_string(),
            poll_interval: Duration::from_millis(500),
        })
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, RpcError> {
        let statuses: Contextual<Vec<Option<SignatureStatus>>> = self
            .rpc
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }

    async fn block_height(&self) -> Result<u64, RpcError> {
        self.rpc
            .call("getBlockHeight", json!([{ "commitment": self.commitment }]))
            .await
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn latest_block_ref(&self) -> Result<BlockRef, RpcError> {
        let resp: Contextual<LatestBlockhash> = self
            .rpc
            .call("getLatestBlockhash", json!([{ "commitment": self.commitment }]))
            .await?;
        Ok(BlockRef {
            blockhash: resp.value.blockhash,
            last_valid_block_height: resp.value.last_valid_block_height,
        })
    }

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationResult, RpcError> {
        let wire = tx
            .unsigned_wire()
            .map_err(|e| RpcError::Provider(e.to_string()))?;
        let resp: Contextual<SimulateValue> = self
            .rpc
            .call(
                "simulateTransaction",
                json!([
                    B64.encode(wire),
                    {
                        "encoding": "base64",
                        "sigVerify": false,
                        "replaceRecentBlockhash": true,
                        "commitment": self.commitment,
                    }
                ]),
            )
            .await?;
        Ok(SimulationResult {
            units_consumed: resp.value.units_consumed,
            err: resp.value.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
            logs: resp.value.logs.unwrap_or_default(),
        })
    }

    async fn send_raw(&self, bytes: &[u8]) -> Result<String, RpcError> {
        self.rpc
            .call(
                "sendTransaction",
                json!([
                    B64.encode(bytes),
                    { "encoding": "base64", "skipPreflight": true, "maxRetries": 0 }
                ]),
            )
            .await
    }

    /// Polls until the signature reaches the configured commitment. Failed
    /// polls are logged and retried; only the block-height ceiling ends the watch.
    async fn confirm(&self, signature: &str, block_ref: &BlockRef) -> Result<ConfirmResult, RpcError> {
        let wanted = commitment_rank(&self.commitment);
        loop {
            match self.signature_status(signature).await {
                Ok(Some(status)) => {
                    let reached = status
                        .confirmation_status
                        .as_deref()
                        .map(commitment_rank)
                        .unwrap_or(0);
                    if reached >= wanted {
                        return Ok(ConfirmResult {
                            slot: status.slot,
                            err: status.err.filter(|e| !e.is_null()).map(|e| e.to_string()),
                        });
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(signature, error = %err, "signature status poll failed"),
            }

            match self.block_height().await {
                Ok(height) if height > block_ref.last_valid_block_height => {
                    return Err(RpcError::BlockHeightExceeded {
                        signature: signature.to_string(),
                    });
                }
                Ok(height) => {
                    debug!(signature, height, ceiling = block_ref.last_valid_block_height, "awaiting confirmation")
                }
                Err(err) => warn!(signature, error = %err, "block height poll failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_receipt(&self, tx_id: &str) -> Result<Option<TransactionReceipt>, RpcError> {
        let tx: Option<ConfirmedTransaction> = self
            .rpc
            .call(
                "getTransaction",
                json!([
                    tx_id,
                    {
                        "encoding": "json",
                        "maxSupportedTransactionVersion": 0,
                        "commitment": self.commitment,
                    }
                ]),
            )
            .await?;
        Ok(tx.map(|tx| TransactionReceipt {
            tx_id: tx_id.to_string(),
            chain: self.chain,
            block_number: tx.slot,
            from: None,
            success: tx
                .meta
                .map(|m| m.err.map(|e| e.is_null()).unwrap_or(true))
                .unwrap_or(false),
            logs: Vec::new(),
        }))
    }

    async fn recent_priority_fees(&self, accounts: &[String]) -> Result<Vec<u64>, RpcError> {
        let fees: Vec<PrioritizationFee> = self
            .rpc
            .call("getRecentPrioritizationFees", json!([accounts]))
            .await?;
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    async fn native_balance(&self, address: &str) -> Result<Option<u128>, RpcError> {
        let resp: Contextual<u64> = self
            .rpc
            .call("getBalance", json!([address, { "commitment": self.commitment }]))
            .await?;
        Ok(Some(resp.value as u128))
    }

    async fn token_balance(&self, address: &str, token: &TokenId) -> Result<Option<u128>, RpcError> {
        let resp: Contextual<Vec<Value>> = self
            .rpc
            .call(
                "getTokenAccountsByOwner",
                json!([address, { "mint": token.address }, { "encoding": "jsonParsed" }]),
            )
            .await?;
        if resp.value.is_empty() {
            return Ok(None);
        }
        let mut total: u128 = 0;
        for account in &resp.value {
            let amount = account
                .pointer("/account/data/parsed/info/tokenAmount/amount")
                .and_then(Value::as_str)
                .ok_or_else(|| RpcError::Provider("token account without amount".into()))?;
            let amount: u128 = amount
                .parse()
                .map_err(|e| RpcError::Provider(format!("token amount: {e}")))?;
            total = total.saturating_add(amount);
        }
        Ok(Some(total))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvmReceipt {
    block_number: Option<String>,
    from: Option<String>,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// EVM chain: receipts, balances and the read-only bridge contract queries.
/// Submission operations are not offered.
#[derive(Debug, Clone)]
pub struct EvmRpc {
    rpc: JsonRpc,
    chain: ChainId,
}

impl EvmRpc {
    pub fn new(url: Url, chain: ChainId) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpc::new(url, "evm")?,
            chain,
        })
    }

    async fn eth_call(&self, to: &str, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let out: String = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": to, "data": format!("0x{}", hex::encode(data)) }, "latest"]),
            )
            .await?;
        hex::decode(out.trim_start_matches("0x"))
            .map_err(|e| RpcError::Provider(format!("eth_call result: {e}")))
    }
}

#[async_trait]
impl ChainRpc for EvmRpc {
    async fn latest_block_ref(&self) -> Result<BlockRef, RpcError> {
        Err(RpcError::Unsupported("latest_block_ref"))
    }

    async fn simulate(&self, _tx: &Transaction) -> Result<SimulationResult, RpcError> {
        Err(RpcError::Unsupported("simulate"))
    }

    async fn send_raw(&self, _bytes: &[u8]) -> Result<String, RpcError> {
        Err(RpcError::Unsupported("send_raw"))
    }

    async fn confirm(&self, _signature: &str, _block_ref: &BlockRef) -> Result<ConfirmResult, RpcError> {
        Err(RpcError::Unsupported("confirm"))
    }

    async fn get_receipt(&self, tx_id: &str) -> Result<Option<TransactionReceipt>, RpcError> {
        let receipt: Option<EvmReceipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([tx_id]))
            .await?;
        receipt
            .map(|r| {
                Ok(TransactionReceipt {
                    tx_id: tx_id.to_string(),
                    chain: self.chain,
                    block_number: r.block_number.as_deref().map(parse_quantity).transpose()?.map(|n| n as u64),
                    from: r.from,
                    success: r.status.as_deref() == Some("0x1"),
                    logs: r.logs,
                })
            })
            .transpose()
    }

    async fn native_balance(&self, address: &str) -> Result<Option<u128>, RpcError> {
        let balance: String = self
            .rpc
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&balance).map(Some)
    }

    async fn token_balance(&self, address: &str, token: &TokenId) -> Result<Option<u128>, RpcError> {
        let mut data = selector("balanceOf(address)").to_vec();
        data.extend_from_slice(&address_word(address)?);
        let out = self.eth_call(&token.address, data).await?;
        word_to_u128(&out).map(Some)
    }

    async fn foreign_asset(&self, token_bridge: &str, token: &TokenId) -> Result<Option<String>, RpcError> {
        let mut data = selector("wrappedAsset(uint16,bytes32)").to_vec();
        data.extend_from_slice(&u128_word(token.chain.0 as u128));
        data.extend_from_slice(&address_word(&token.address)?);
        let out = self.eth_call(token_bridge, data).await?;
        if out.len() < 32 || out[..32].iter().all(|b| *b == 0) {
            return Ok(None);
        }
        Ok(Some(format!("0x{}", hex::encode(&out[12..32]))))
    }

    async fn is_message_consumed(&self, contract: &str, key: &[u8; 32]) -> Result<bool, RpcError> {
        let mut data = selector("isTransferCompleted(bytes32)").to_vec();
        data.extend_from_slice(key);
        let out = self.eth_call(contract, data).await?;
        Ok(word_to_u128(&out)? != 0)
    }

    async fn is_nonce_used(&self, contract: &str, key: &[u8; 32]) -> Result<bool, RpcError> {
        let mut data = selector("usedNonces(bytes32)").to_vec();
        data.extend_from_slice(key);
        let out = self.eth_call(contract, data).await?;
        Ok(word_to_u128(&out)? != 0)
    }

    async fn native_swap_quote(&self, relayer: &str, token: &TokenId, amount: u128) -> Result<u128, RpcError> {
        let mut data = selector("calculateNativeSwapAmountOut(address,uint256)").to_vec();
        data.extend_from_slice(&address_word(&token.address)?);
        data.extend_from_slice(&u128_word(amount));
        let out = self.eth_call(relayer, data).await?;
        word_to_u128(&out)
    }

    async fn max_native_swap(&self, relayer: &str, token: &TokenId) -> Result<u128, RpcError> {
        let mut data = selector("calculateMaxSwapAmountIn(address)").to_vec();
        data.extend_from_slice(&address_word(&token.address)?);
        let out = self.eth_call(relayer, data).await?;
        word_to_u128(&out)
    }
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Left-pad a hex (`0x..`) or base58 address into a 32-byte word.
pub fn address_word(address: &str) -> Result<[u8; 32], RpcError> {
    let bytes = match address.strip_prefix("0x") {
        Some(hex_part) => hex::decode(hex_part)
            .map_err(|e| RpcError::Provider(format!("bad address {address}: {e}")))?,
        None => bs58::decode(address)
            .into_vec()
            .map_err(|e| RpcError::Provider(format!("bad address {address}: {e}")))?,
    };
    if bytes.len() > 32 {
        return Err(RpcError::Provider(format!("address {address} longer than 32 bytes")));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn u128_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_to_u128(out: &[u8]) -> Result<u128, RpcError> {
    if out.len() < 32 {
        return Err(RpcError::Provider(format!("short eth_call result: {} bytes", out.len())));
    }
    if out[..16].iter().any(|b| *b != 0) {
        return Ok(u128::MAX);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&out[16..32]);
    Ok(u128::from_be_bytes(low))
}

fn parse_quantity(quantity: &str) -> Result<u128, RpcError> {
    u128::from_str_radix(quantity.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Provider(format!("bad quantity {quantity}: {e}")))
}
