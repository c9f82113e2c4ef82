// Account-chain rpc confirmation tests
// Runs the signature-status watch against a mock JSON-RPC node

use httpmock::Method::POST;
use httpmock::MockServer;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use url::Url;
use xchain_router::errors::RpcError;
use xchain_router::transport::{BlockRef, ChainRpc, ConfirmResult, SolanaRpc};
use xchain_router::types::ChainId;

fn block_ref() -> BlockRef {
    BlockRef {
        blockhash: "4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZAMdL4VZHirAn".into(),
        last_valid_block_height: 1_000_000,
    }
}

fn rpc(server: &MockServer) -> SolanaRpc {
    SolanaRpc::new(Url::parse(&server.base_url()).unwrap(), ChainId::SOLANA)
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

fn height(value: u64) -> serde_json::Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": value })
}

#[tokio::test]
async fn status_outage_keeps_watching_until_confirmed() {
    let server = MockServer::start_async().await;
    let mut outage = server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("getSignatureStatuses");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("getBlockHeight");
            then.status(200).json_body(height(900));
        })
        .await;

    let rpc = rpc(&server);
    let watch = tokio::spawn(async move { rpc.confirm("sig", &block_ref()).await });

    while outage.hits_async().await == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    outage.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("getSignatureStatuses");
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": { "slot": 7 },
                    "value": [{
                        "slot": 7,
                        "confirmations": null,
                        "err": null,
                        "confirmationStatus": "finalized"
                    }]
                }
            }));
        })
        .await;

    let result = tokio::time::timeout(Duration::from_secs(5), watch)
        .await
        .expect("watch should finish once the node recovers")
        .unwrap();

    assert_eq!(
        result,
        Ok(ConfirmResult {
            slot: Some(7),
            err: None,
        })
    );
}

#[tokio::test]
async fn status_outage_past_ceiling_is_block_height_exceeded() {
    let server = MockServer::start_async().await;
    let outage = server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("getSignatureStatuses");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_contains("getBlockHeight");
            then.status(200).json_body(height(1_000_001));
        })
        .await;

    let result = rpc(&server).confirm("sig", &block_ref()).await;

    assert_eq!(
        result,
        Err(RpcError::BlockHeightExceeded {
            signature: "sig".into(),
        })
    );
    assert_eq!(outage.hits_async().await, 1);
}
