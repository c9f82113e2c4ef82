// Transport layer: chain RPC and attestation collaborators
// This file defines the capability traits the submission engine and the routes
// consume, plus the HTTP implementations in the submodules

pub mod attestation;
pub mod jsonrpc;

use crate::errors::{FetchError, RpcError};
use crate::execution::transaction::Transaction;
use crate::message::{SignedMessage, TransactionReceipt};
use crate::types::{ChainId, TokenId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use attestation::AttestationApi;
pub use jsonrpc::{EvmRpc, JsonRpc, SolanaRpc};

/// Recent block reference plus the height after which a transaction built
/// on it can no longer land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub units_consumed: Option<u64>,
    pub err: Option<String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResult {
    pub slot: Option<u64>,
    /// On-chain execution error, if the transaction landed but failed.
    pub err: Option<String>,
}

/// Per-chain RPC capability. The first five operations drive submission and
/// classification; the rest are read-only queries used by the routes and
/// default to `Unsupported`.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn latest_block_ref(&self) -> Result<BlockRef, RpcError>;

    async fn simulate(&self, tx: &Transaction) -> Result<SimulationResult, RpcError>;

    async fn send_raw(&self, bytes: &[u8]) -> Result<String, RpcError>;

    /// Resolves once the signature reaches the configured commitment; fails
    /// with `BlockHeightExceeded` once `block_ref` has expired. Transport or
    /// provider errors are treated as transient by the submitter.
    async fn confirm(&self, signature: &str, block_ref: &BlockRef)
        -> Result<ConfirmResult, RpcError>;

    async fn get_receipt(&self, tx_id: &str) -> Result<Option<TransactionReceipt>, RpcError>;

    async fn recent_priority_fees(&self, _accounts: &[String]) -> Result<Vec<u64>, RpcError> {
        Ok(Vec::new())
    }

    async fn native_balance(&self, _address: &str) -> Result<Option<u128>, RpcError> {
        Err(RpcError::Unsupported("native_balance"))
    }

    async fn token_balance(
        &self,
        _address: &str,
        _token: &TokenId,
    ) -> Result<Option<u128>, RpcError> {
        Err(RpcError::Unsupported("token_balance"))
    }

    /// Wrapped address of `token` on this chain as registered with `token_bridge`.
    async fn foreign_asset(
        &self,
        _token_bridge: &str,
        _token: &TokenId,
    ) -> Result<Option<String>, RpcError> {
        Err(RpcError::Unsupported("foreign_asset"))
    }

    /// Whether `contract` has already consumed the message identified by `key`.
    async fn is_message_consumed(&self, _contract: &str, _key: &[u8; 32]) -> Result<bool, RpcError> {
        Err(RpcError::Unsupported("is_message_consumed"))
    }

    /// Whether a CCTP message transmitter has recorded the burn nonce `key`.
    async fn is_nonce_used(&self, _contract: &str, _key: &[u8; 32]) -> Result<bool, RpcError> {
        Err(RpcError::Unsupported("is_nonce_used"))
    }

    async fn native_swap_quote(
        &self,
        _relayer: &str,
        _token: &TokenId,
        _amount: u128,
    ) -> Result<u128, RpcError> {
        Err(RpcError::Unsupported("native_swap_quote"))
    }

    async fn max_native_swap(&self, _relayer: &str, _token: &TokenId) -> Result<u128, RpcError> {
        Err(RpcError::Unsupported("max_native_swap"))
    }
}

/// Attestation network lookups.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// Fails with `FetchError::NotFound` when the network has no record of
    /// a message for this transaction.
    async fn fetch(&self, tx_id: &str, chain: ChainId) -> Result<SignedMessage, FetchError>;

    async fn fetch_cctp_attestation(&self, _message_hash: &[u8; 32]) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unavailable(
            "cctp attestation source not configured".into(),
        ))
    }
}
