// Fee estimator integration tests
// Simulation retry policy and compute budget derivation against a scripted rpc

mod common;

use common::{FakeChainRpc, ManualClock};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use xchain_router::config::SubmissionConfig;
use xchain_router::errors::SubmitError;
use xchain_router::execution::fee::{FeeEstimator, PriorityFeeBid};
use xchain_router::execution::transaction::{AccountMeta, Instruction, Transaction};
use xchain_router::transport::SimulationResult;

fn failed(log: &str) -> SimulationResult {
    SimulationResult {
        units_consumed: None,
        err: Some("simulation error".into()),
        logs: vec![log.to_string()],
    }
}

fn ok(units: u64) -> SimulationResult {
    SimulationResult {
        units_consumed: Some(units),
        err: None,
        logs: Vec::new(),
    }
}

fn candidate() -> Transaction {
    Transaction::new(
        "payer111",
        vec![Instruction::new(
            "program111",
            vec![
                AccountMeta::writable("payer111", true),
                AccountMeta::writable("vault111", false),
            ],
            vec![7],
        )],
    )
}

fn estimator(rpc: Arc<FakeChainRpc>, clock: Arc<ManualClock>) -> FeeEstimator {
    FeeEstimator::new(rpc, clock, SubmissionConfig::default())
}

#[tokio::test]
async fn limit_is_ceiling_of_simulated_units_with_margin() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock).with_priority_fees(vec![5, 9, 1]));
    let mut tx = candidate();

    let bid = estimator(rpc.clone(), clock).estimate(&mut tx).await.unwrap();

    assert_eq!(
        bid,
        PriorityFeeBid {
            compute_unit_limit: 120_000,
            compute_unit_price: 9,
        }
    );
    assert!(tx.recent_block_ref.is_some(), "simulation needs a block reference");
    assert_eq!(rpc.simulated().len(), 1);
}

#[tokio::test]
async fn zero_units_fall_back_to_baseline() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock).with_simulations(vec![ok(0)]));

    let bid = estimator(rpc, clock).estimate(&mut candidate()).await.unwrap();

    assert_eq!(bid.compute_unit_limit, 240_000);
    assert_eq!(bid.compute_unit_price, 1);
}

#[tokio::test]
async fn retries_stale_block_ref_and_slippage() {
    let clock = ManualClock::new();
    let rpc = Arc::new(FakeChainRpc::new(&clock).with_simulations(vec![
        failed("Program log: BlockhashNotFound"),
        failed("Program log: SlippageToleranceExceeded"),
        ok(50_000),
    ]));

    let bid = estimator(rpc.clone(), clock.clone())
        .estimate(&mut candidate())
        .await
        .unwrap();

    assert_eq!(bid.compute_unit_limit, 60_000);
    assert_eq!(rpc.simulated().len(), 3);
    assert_eq!(clock.slept(), vec![Duration::from_millis(1_000); 2]);
}

#[tokio::test]
async fn other_failures_are_fatal_on_first_attempt() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock).with_simulations(vec![failed("Program log: insufficient funds")]),
    );

    let err = estimator(rpc.clone(), clock.clone())
        .estimate(&mut candidate())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::SimulationFailed {
            error: "simulation error".into(),
            logs: vec!["Program log: insufficient funds".into()],
        }
    );
    assert_eq!(rpc.simulated().len(), 1);
    assert_eq!(clock.ticks(), 0);
}

#[tokio::test]
async fn gives_up_after_five_attempts_with_all_logs() {
    let clock = ManualClock::new();
    let rpc = Arc::new(
        FakeChainRpc::new(&clock).with_default_simulation(failed("Program log: BlockhashNotFound")),
    );

    let err = estimator(rpc.clone(), clock.clone())
        .estimate(&mut candidate())
        .await
        .unwrap_err();

    match err {
        SubmitError::SimulationFailed { error, logs } => {
            assert!(error.starts_with("gave up after 5 attempts"));
            assert_eq!(logs, vec!["Program log: BlockhashNotFound".to_string(); 5]);
        }
        other => panic!("expected simulation failure, got {other:?}"),
    }
    assert_eq!(rpc.simulated().len(), 5);
    assert_eq!(clock.ticks(), 4);
}
