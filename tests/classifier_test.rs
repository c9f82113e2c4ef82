// Route classifier integration tests
// Fixed synthetic chain state: attested messages, receipts and emitter sets

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use xchain_router::errors::{FetchError, RouteError};
use xchain_router::router::RouteClassifier;
use xchain_router::routes::Route;
use xchain_router::types::ChainId;

const TX: &str = "0x9f3c4b7d2a61e0f58c3b9a4d7e2f1c0b6a5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f";

struct Fixture {
    classifier: RouteClassifier,
    fetcher: Arc<FakeMessageFetcher>,
    eth: Arc<FakeChainRpc>,
}

fn fixture(fetcher: FakeMessageFetcher, eth: impl FnOnce(FakeChainRpc) -> FakeChainRpc) -> Fixture {
    let clock = ManualClock::new();
    let fetcher = Arc::new(fetcher);
    let eth = Arc::new(eth(FakeChainRpc::new(&clock)));
    let sol = Arc::new(FakeChainRpc::new(&clock));
    let ctx = context(fetcher.clone(), eth.clone(), sol, clock);
    Fixture {
        classifier: RouteClassifier::new(Arc::new(ctx)),
        fetcher,
        eth,
    }
}

fn with_message(emitter: [u8; 32], payload: Vec<u8>) -> Fixture {
    let bytes = vaa(ChainId::ETHEREUM, emitter, 42, &payload);
    fixture(FakeMessageFetcher::new().with_message(TX, bytes), |rpc| rpc)
}

#[tokio::test]
async fn burn_receipt_without_message_is_manual_cctp() {
    let f = fixture(FakeMessageFetcher::new(), |rpc| {
        rpc.with_receipt(receipt(TX, ChainId::ETHEREUM, vec![transfer_log(), deposit_for_burn_log(12, 5)]))
    });

    let route = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap();

    assert_eq!(route, Route::CctpManual);
    assert_eq!(f.eth.receipt_lookups(), 1);
}

#[tokio::test]
async fn receipt_without_burn_propagates_not_found() {
    let f = fixture(FakeMessageFetcher::new(), |rpc| {
        rpc.with_receipt(receipt(TX, ChainId::ETHEREUM, vec![transfer_log()]))
    });

    let err = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap_err();

    assert_eq!(
        err,
        RouteError::MessageFetch(FetchError::NotFound {
            tx_id: TX.to_string(),
            chain: ChainId::ETHEREUM,
        })
    );
}

#[tokio::test]
async fn missing_receipt_fails_with_receipt_not_found() {
    let f = fixture(FakeMessageFetcher::new(), |rpc| rpc);

    let err = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap_err();

    assert_eq!(
        err,
        RouteError::ReceiptNotFound {
            tx_id: TX.to_string(),
            chain: ChainId::ETHEREUM,
        }
    );
}

#[tokio::test]
async fn other_fetch_errors_skip_the_receipt_fallback() {
    let f = fixture(
        FakeMessageFetcher::new().with_error(TX, FetchError::Transport("502 bad gateway".into())),
        |rpc| rpc.with_receipt(receipt(TX, ChainId::ETHEREUM, vec![deposit_for_burn_log(1, 5)])),
    );

    let err = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap_err();

    assert_eq!(
        err,
        RouteError::MessageFetch(FetchError::Transport("502 bad gateway".into()))
    );
    assert_eq!(f.eth.receipt_lookups(), 0);
}

#[tokio::test]
async fn cctp_emitter_wins_over_payload_kind() {
    let f = with_message(emitter_of(CCTP_INTEGRATION), vec![0x01, 0x02]);

    let route = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap();

    assert_eq!(route, Route::CctpRelay);
}

#[tokio::test]
async fn relay_only_destination_is_automatic_relay_for_any_kind() {
    let f = with_message(TOKEN_BRIDGE_EMITTER, transfer_payload(1, ChainId::SEI));

    let route = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap();

    assert_eq!(route, Route::AutomaticRelay);
}

#[tokio::test]
async fn automatic_payload_is_automatic_relay() {
    let f = with_message(TOKEN_BRIDGE_EMITTER, transfer_payload(3, ChainId::SOLANA));

    let route = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap();

    assert_eq!(route, Route::AutomaticRelay);
}

#[tokio::test]
async fn other_payloads_are_standard_bridge() {
    for kind in [1u8, 2, 9] {
        let f = with_message(TOKEN_BRIDGE_EMITTER, transfer_payload(kind, ChainId::SOLANA));

        let route = f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap();

        assert_eq!(route, Route::StandardBridge, "payload kind {kind}");
    }
}

#[tokio::test]
async fn classification_is_deterministic() {
    let f = with_message(TOKEN_BRIDGE_EMITTER, transfer_payload(3, ChainId::SOLANA));

    let mut routes = Vec::new();
    for _ in 0..3 {
        routes.push(f.classifier.classify(TX, ChainId::ETHEREUM).await.unwrap());
    }

    assert_eq!(routes, vec![Route::AutomaticRelay; 3]);
    assert_eq!(f.fetcher.calls(), 3);
}
