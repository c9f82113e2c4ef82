// Transaction submitter integration tests
// Drives the confirm/resend loop with a manual clock and a scripted rpc

mod common;

use common::{signer, ConfirmScript, FakeChainRpc, ManualClock};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use xchain_router::config::SubmissionConfig;
use xchain_router::errors::SubmitError;
use xchain_router::execution::submitter::{SubmissionAttempt, TransactionSubmitter};
use xchain_router::execution::transaction::{AccountMeta, Instruction, SignedTransaction, Transaction};
use xchain_router::transport::BlockRef;

fn block_ref() -> BlockRef {
    BlockRef {
        blockhash: "4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZAMdL4VZHirAn".into(),
        last_valid_block_height: 650,
    }
}

fn attempt() -> SubmissionAttempt {
    let signed = SignedTransaction::new(vec![9, 9, 9, 9], [0x5a; 64]);
    SubmissionAttempt::new(&signed, block_ref())
}

fn submitter(rpc: Arc<FakeChainRpc>, clock: Arc<ManualClock>) -> TransactionSubmitter {
    TransactionSubmitter::new(rpc, signer(), clock, SubmissionConfig::default())
}

#[tokio::test]
async fn confirms_after_two_timeouts_with_identical_resends() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock).with_confirm(ConfirmScript::confirmed_after(2)));
    let attempt = attempt();

    let signature = submitter(rpc.clone(), clock.clone())
        .submit(&attempt)
        .await
        .unwrap();

    assert_eq!(signature, attempt.signature());
    assert_eq!(clock.ticks(), 2);
    assert_eq!(clock.slept(), vec![Duration::from_millis(5_000); 2]);
    let sent = rpc.sent();
    assert_eq!(sent.len(), 3, "one initial send plus two resends");
    assert!(sent.iter().all(|bytes| bytes.as_slice() == attempt.serialized()));
}

#[tokio::test]
async fn immediate_confirmation_sends_once() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock));

    submitter(rpc.clone(), clock.clone())
        .submit(&attempt())
        .await
        .unwrap();

    assert_eq!(rpc.sent().len(), 1);
    assert_eq!(clock.ticks(), 0);
}

#[tokio::test]
async fn expiry_surfaces_as_expired_without_further_resends() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock).with_confirm(ConfirmScript::expired_after(1)));
    let attempt = attempt();

    let err = submitter(rpc.clone(), clock.clone())
        .submit(&attempt)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Expired {
            signature: attempt.signature().to_string()
        }
    );
    assert_eq!(rpc.sent().len(), 2);
}

#[tokio::test]
async fn on_chain_error_is_fatal_and_carries_detail() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock).with_confirm(ConfirmScript::failed_after(0, "InstructionError(0, Custom(1))")),
    );

    let err = submitter(rpc, clock).submit(&attempt()).await.unwrap_err();

    match err {
        SubmitError::OnChainFailure { detail, .. } => {
            assert_eq!(detail, "InstructionError(0, Custom(1))")
        }
        other => panic!("expected on-chain failure, got {other:?}"),
    }
}

#[tokio::test]
async fn interrupted_watch_is_rearmed_until_confirmed() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock)
            .with_confirm(ConfirmScript::confirmed_after(1).with_transient_failures(1)),
    );
    let attempt = attempt();

    let signature = submitter(rpc.clone(), clock.clone())
        .submit(&attempt)
        .await
        .unwrap();

    assert_eq!(signature, attempt.signature());
    assert_eq!(rpc.confirm_calls(), 2);
    assert_eq!(clock.ticks(), 1);
    let sent = rpc.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|bytes| bytes.as_slice() == attempt.serialized()));
}

#[tokio::test]
async fn repeated_watch_failures_still_end_in_expiry() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock)
            .with_confirm(ConfirmScript::expired_after(0).with_transient_failures(3)),
    );
    let attempt = attempt();

    let err = submitter(rpc.clone(), clock.clone())
        .submit(&attempt)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Expired {
            signature: attempt.signature().to_string()
        }
    );
    assert_eq!(rpc.confirm_calls(), 4);
    assert_eq!(rpc.sent().len(), 4);
}

#[tokio::test]
async fn failed_resends_are_swallowed() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock)
            .with_confirm(ConfirmScript::confirmed_after(3))
            .with_failing_resends(),
    );

    let result = submitter(rpc.clone(), clock).submit(&attempt()).await;

    assert!(result.is_ok());
    assert_eq!(rpc.sent().len(), 4);
}

#[tokio::test]
async fn sign_and_send_reprices_and_signs_once() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock)
            .with_confirm(ConfirmScript::confirmed_after(1))
            .with_priority_fees(vec![10, 20, 30, 40]),
    );
    let submitter = submitter(rpc.clone(), clock);
    let payer = submitter.signer_address();

    let mut tx = Transaction::new(
        payer.clone(),
        vec![Instruction::new(
            "wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb",
            vec![AccountMeta::writable(payer.clone(), true)],
            vec![1, 2, 3],
        )],
    );
    tx.instructions.push(Instruction::set_compute_unit_limit(1));
    tx.instructions.push(Instruction::set_compute_unit_price(1));

    let signature = submitter.sign_and_send(tx).await.unwrap();

    let sent = rpc.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(signature, bs58::encode(&sent[0][1..65]).into_string());

    let landed: Transaction = bcs::from_bytes(&sent[0][65..]).unwrap();
    assert_eq!(landed.fee_payer, payer);
    assert_eq!(landed.instructions.len(), 3);
    assert_eq!(landed.compute_unit_limit(), Some(120_000));
    assert_eq!(landed.compute_unit_price(), Some(40));

    let simulated = rpc.simulated();
    assert_eq!(simulated.len(), 1);
    assert!(simulated[0].instructions.iter().all(|ix| !ix.is_compute_budget()));
}
