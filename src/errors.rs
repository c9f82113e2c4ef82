// Error types and error handling module
// This file defines the error taxonomy shared by the transports, the submission
// engine and the route operator. Kinds stay distinct so callers can match on them.

use crate::routes::Route;
use crate::types::ChainId;
use thiserror::Error;

/// Failures reported by a chain RPC collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    /// The confirmation watch outlived the transaction's block-height ceiling.
    #[error("block height exceeded for {signature}")]
    BlockHeightExceeded { signature: String },
    #[error("operation not supported by this rpc: {0}")]
    Unsupported(&'static str),
}

/// Failures reported by the message-fetch (attestation) collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("no signed message found for {tx_id} on {chain}")]
    NotFound { tx_id: String, chain: ChainId },
    #[error("attestation transport error: {0}")]
    Transport(String),
    #[error("attestation decode error: {0}")]
    Decode(String),
    /// The attestation exists but is not usable yet, or the source is not configured.
    #[error("attestation unavailable: {0}")]
    Unavailable(String),
}

/// Malformed signed message or payload bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message truncated: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("unsupported message version {0}")]
    Version(u8),
    #[error("unexpected payload kind {0}")]
    PayloadKind(u8),
    #[error("invalid log entry: {0}")]
    Log(String),
}

/// Failures of the fee estimator and transaction submitter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("simulation failed: {error}\nLogs:\n  {}", logs.join("\n  "))]
    SimulationFailed { error: String, logs: Vec<String> },
    #[error("transaction {signature} failed on chain: {detail}")]
    OnChainFailure { signature: String, detail: String },
    #[error("transaction {signature} expired before confirmation")]
    Expired { signature: String },
    #[error("signing error: {0}")]
    Signing(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Errors surfaced by the operator and the route strategies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("{0} is not a valid route")]
    UnknownRoute(Route),
    #[error("no receipt for {tx_id} on {chain}")]
    ReceiptNotFound { tx_id: String, chain: ChainId },
    #[error("chain {0} is not configured")]
    UnknownChain(ChainId),
    #[error("{operation} is not supported by the {route} route")]
    Unsupported {
        route: Route,
        operation: &'static str,
    },
    #[error("route options do not match the {0} route")]
    InvalidOptions(Route),
    #[error("invalid transfer request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    MessageFetch(#[from] FetchError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl RouteError {
    pub(crate) fn unsupported(route: Route, operation: &'static str) -> Self {
        RouteError::Unsupported { route, operation }
    }
}
