//! Wallet RPC verifier against a mocked `monero-wallet-rpc`.

use std::str::FromStr;
use std::time::Duration;

use hyper::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xmr402::auth::{AuthScheme, Credential, TxReference};
use xmr402::blockchain::{BlockchainError, Network, SharedVerifier, WalletConfig, WalletRpcClient};
use xmr402::config::ProxyConfig;
use xmr402::lifecycle::{bootstrap, Shutdown};

mod common;

use common::{bearer_token, start_upstream, Client, TXID};

const STAGENET_ADDRESS: &str = "5AddressOnStagenet";

fn rpc_ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": "0", "result": result }))
}

async fn mock_method(server: &MockServer, name: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/json_rpc"))
        .and(body_partial_json(json!({ "method": name })))
        .respond_with(response)
        .mount(server)
        .await;
}

fn wallet_config(server: &MockServer, network: Network) -> WalletConfig {
    WalletConfig {
        rpc_url: format!("{}/json_rpc", server.uri()),
        network,
        ..WalletConfig::default()
    }
}

fn credential() -> Credential {
    Credential {
        scheme: AuthScheme::Bearer,
        tx_reference: TxReference::from_str(TXID).unwrap(),
        signature: "OutProofV2sig".to_string(),
    }
}

#[tokio::test]
async fn test_proof_check_maps_wallet_answer() {
    let server = MockServer::start().await;
    mock_method(&server, "get_address", rpc_ok(json!({ "address": STAGENET_ADDRESS }))).await;
    mock_method(&server, "refresh", rpc_ok(json!({ "blocks_fetched": 2, "received_money": false }))).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "check_tx_proof",
            "params": { "txid": TXID, "address": STAGENET_ADDRESS, "signature": "OutProofV2sig" }
        })))
        .respond_with(rpc_ok(json!({
            "good": true,
            "received": 42_000_000_000u64,
            "in_pool": false,
            "confirmations": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WalletRpcClient::new(wallet_config(&server, Network::Stagenet)).unwrap();
    let verifier = SharedVerifier::new(client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(verifier.address(), STAGENET_ADDRESS);

    let result = verifier.verify_payment(&credential()).await.unwrap();
    assert!(result.proof_valid);
    assert!(!result.in_mempool);
    assert_eq!(result.amount_received, 42_000_000_000);
    assert_eq!(result.confirmations, 7);
}

#[tokio::test]
async fn test_remote_error_is_surfaced() {
    let server = MockServer::start().await;
    mock_method(&server, "get_address", rpc_ok(json!({ "address": STAGENET_ADDRESS }))).await;
    mock_method(&server, "refresh", rpc_ok(json!({}))).await;
    mock_method(
        &server,
        "check_tx_proof",
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "0",
            "error": { "code": -1, "message": "Failed to parse txid" }
        })),
    )
    .await;

    let client = WalletRpcClient::new(wallet_config(&server, Network::Stagenet)).unwrap();
    let verifier = SharedVerifier::new(client, Duration::from_secs(5)).await.unwrap();

    match verifier.verify_payment(&credential()).await {
        Err(BlockchainError::Remote { code, message }) => {
            assert_eq!(code, -1);
            assert_eq!(message, "Failed to parse txid");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_network_mismatch_fails_startup() {
    let server = MockServer::start().await;
    mock_method(&server, "get_address", rpc_ok(json!({ "address": "4MainnetAddress" }))).await;

    let client = WalletRpcClient::new(wallet_config(&server, Network::Stagenet)).unwrap();
    assert!(matches!(
        client.verify_network().await,
        Err(BlockchainError::NetworkMismatch { expected: Network::Stagenet, .. })
    ));
}

#[tokio::test]
async fn test_open_wallet_failure_is_reported() {
    let server = MockServer::start().await;
    mock_method(&server, "open_wallet", ResponseTemplate::new(500)).await;

    let mut config = wallet_config(&server, Network::Stagenet);
    config.wallet_file = Some("server".to_string());
    let client = WalletRpcClient::new(config).unwrap();
    assert!(matches!(client.open_wallet().await, Err(BlockchainError::Wallet(_))));
}

#[tokio::test]
async fn test_bootstrap_serves_paid_request() {
    let server = MockServer::start().await;
    mock_method(&server, "get_address", rpc_ok(json!({ "address": STAGENET_ADDRESS }))).await;
    mock_method(&server, "get_height", rpc_ok(json!({ "height": 1_500_000 }))).await;
    mock_method(&server, "refresh", rpc_ok(json!({}))).await;
    mock_method(
        &server,
        "check_tx_proof",
        rpc_ok(json!({ "good": true, "received": 10_000_000_000u64, "in_pool": false, "confirmations": 3 })),
    )
    .await;

    let (upstream, _) = start_upstream().await;
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = upstream.to_string();
    config.wallet = wallet_config(&server, Network::Stagenet);

    let (proxy, listener) = bootstrap(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = proxy.run(listener, stop).await;
    });

    let mut client = Client::connect(addr).await;
    let reply = client
        .send(Method::GET, "/paid", Some(&bearer_token("OutProofV2sig")))
        .await
        .unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "upstream saw GET /paid");

    shutdown.trigger();
}

#[tokio::test]
async fn test_bootstrap_rejects_unreachable_wallet() {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.wallet.rpc_url = "http://127.0.0.1:1/json_rpc".to_string();
    config.wallet.rpc_timeout_secs = 2;

    assert!(bootstrap(&config).await.is_err());
}
