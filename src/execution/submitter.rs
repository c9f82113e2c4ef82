// Transaction submitter - prices, signs, sends and confirms a transaction
// This file implements the send/confirm/resend loop. The payload is serialized
// once; every resend reuses the identical bytes so the chain dedups on signature

use crate::config::SubmissionConfig;
use crate::errors::{RpcError, SubmitError};
use crate::execution::clock::Clock;
use crate::execution::fee::FeeEstimator;
use crate::execution::transaction::{SignedTransaction, Transaction};
use crate::metrics::{SUBMISSIONS, SUBMISSION_RESENDS};
use crate::signing::TransactionSigner;
use crate::transport::{BlockRef, ChainRpc, ConfirmResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Progress of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Unsent,
    Submitted,
    TimedOut,
    Confirmed,
    Expired,
    OnChainFailure,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Unsent => "unsent",
            SubmissionState::Submitted => "submitted",
            SubmissionState::TimedOut => "timed_out",
            SubmissionState::Confirmed => "confirmed",
            SubmissionState::Expired => "expired",
            SubmissionState::OnChainFailure => "on_chain_failure",
        }
    }
}

/// A signed payload bound to its expiry ceiling. Immutable: resubmission
/// must never re-sign or alter the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    serialized: Vec<u8>,
    signature: String,
    block_ref: BlockRef,
}

impl SubmissionAttempt {
    pub fn new(signed: &SignedTransaction, block_ref: BlockRef) -> Self {
        Self {
            serialized: signed.serialize(),
            signature: signed.signature(),
            block_ref,
        }
    }

    pub fn serialized(&self) -> &[u8] {
        &self.serialized
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn expiry_height(&self) -> u64 {
        self.block_ref.last_valid_block_height
    }
}

pub struct TransactionSubmitter {
    rpc: Arc<dyn ChainRpc>,
    signer: Arc<dyn TransactionSigner>,
    clock: Arc<dyn Clock>,
    estimator: FeeEstimator,
    config: SubmissionConfig,
}

impl TransactionSubmitter {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        signer: Arc<dyn TransactionSigner>,
        clock: Arc<dyn Clock>,
        config: SubmissionConfig,
    ) -> Self {
        let estimator = FeeEstimator::new(rpc.clone(), clock.clone(), config.clone());
        Self {
            rpc,
            signer,
            clock,
            estimator,
            config,
        }
    }

    pub fn signer_address(&self) -> String {
        self.signer.address()
    }

    /// Re-price, sign and submit `tx`, returning its signature once it is
    /// confirmed.
    #[tracing::instrument(skip_all, fields(payer = %tx.fee_payer))]
    pub async fn sign_and_send(&self, mut tx: Transaction) -> Result<String, SubmitError> {
        let block_ref = self.rpc.latest_block_ref().await?;
        tx.recent_block_ref = Some(block_ref.blockhash.clone());

        let stripped = tx.strip_compute_budget();
        if stripped > 0 {
            debug!(stripped, "removed existing compute budget instructions");
        }
        let bid = self.estimator.estimate(&mut tx).await?;
        tx.instructions.extend(bid.instructions());

        let signed = self.signer.sign_transaction(&tx).await?;
        let attempt = SubmissionAttempt::new(&signed, block_ref);
        self.submit(&attempt).await
    }

    /// Send `attempt` and drive it to a terminal state, resending the same
    /// bytes every time the confirmation watch outlasts the resend interval.
    /// A watch that fails with a transport or provider error is re-armed.
    #[tracing::instrument(skip_all, fields(signature = %attempt.signature(), expiry = attempt.expiry_height()))]
    pub async fn submit(&self, attempt: &SubmissionAttempt) -> Result<String, SubmitError> {
        debug!(state = SubmissionState::Unsent.as_str(), "sending transaction");
        let signature = self.rpc.send_raw(attempt.serialized()).await?;
        if signature != attempt.signature() {
            warn!(
                returned = %signature,
                "rpc returned a different signature than the one signed"
            );
        }
        debug!(state = SubmissionState::Submitted.as_str(), "awaiting confirmation");

        let interval = self.config.resend_interval();
        let mut confirmation = self.rpc.confirm(attempt.signature(), &attempt.block_ref);
        let mut resends: u32 = 0;

        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut confirmation => match outcome {
                    Err(err @ (RpcError::Transport(_) | RpcError::Provider(_))) => {
                        warn!(error = %err, "confirmation watch failed; re-arming");
                        self.clock.sleep(interval).await;
                        self.resend(attempt, interval, &mut resends).await;
                        confirmation = self.rpc.confirm(attempt.signature(), &attempt.block_ref);
                    }
                    outcome => break outcome,
                },
                _ = self.clock.sleep(interval) => {
                    self.resend(attempt, interval, &mut resends).await;
                }
            }
        };

        let (state, result) = match outcome {
            Ok(ConfirmResult { err: Some(detail), .. }) => (
                SubmissionState::OnChainFailure.as_str(),
                Err(SubmitError::OnChainFailure {
                    signature: attempt.signature().to_string(),
                    detail,
                }),
            ),
            Ok(ConfirmResult { slot, err: None }) => {
                info!(slot = ?slot, resends, "transaction confirmed");
                (
                    SubmissionState::Confirmed.as_str(),
                    Ok(attempt.signature().to_string()),
                )
            }
            Err(RpcError::BlockHeightExceeded { .. }) => (
                SubmissionState::Expired.as_str(),
                Err(SubmitError::Expired {
                    signature: attempt.signature().to_string(),
                }),
            ),
            Err(other) => ("rpc_error", Err(SubmitError::Rpc(other))),
        };

        SUBMISSIONS.with_label_values(&[state]).inc();
        if let Err(err) = &result {
            warn!(state, error = %err, "submission ended without success");
        }
        result
    }

    async fn resend(&self, attempt: &SubmissionAttempt, interval: Duration, resends: &mut u32) {
        *resends += 1;
        SUBMISSION_RESENDS.inc();
        info!(
            state = SubmissionState::TimedOut.as_str(),
            waited_ms = interval.as_millis() as u64 * *resends as u64,
            resends = *resends,
            "transaction not confirmed yet; resending"
        );
        // "already processed" and similar are expected while the first send is pending.
        if let Err(err) = self.rpc.send_raw(attempt.serialized()).await {
            warn!(error = %err, "resend failed; still awaiting confirmation");
        }
    }
}
