#![cfg(unix)]

use std::net::SocketAddr;

use httpmock::MockServer;
use rstest::rstest;
use serde_json::json;

use crate::core::client::chain::{ChainClientError, MockChainClient};
use crate::tests::common::{fake_solc, verification_request, COMPILED_CREATION, COMPILED_DEPLOYED};
use crate::tests::config::{TestConfigBuilder, TestConfigBuilderReturns};
use crate::types::verification::{VerificationRequest, VerificationResponse, VerificationStatus};

async fn start(dir: &tempfile::TempDir, chain: MockChainClient) -> TestConfigBuilderReturns {
    fake_solc(dir.path());
    TestConfigBuilder::new(dir.path()).configure_chain_client(chain).configure_api_server().build().await
}

async fn post_verify(addr: SocketAddr, body: serde_json::Value) -> (u16, VerificationResponse) {
    let response = reqwest::Client::new().post(format!("http://{}/verify", addr)).json(&body).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn request_body(request: VerificationRequest) -> serde_json::Value {
    serde_json::to_value(request).unwrap()
}

fn chain_returning(result: Result<&'static str, ChainClientError>) -> MockChainClient {
    let mut chain = MockChainClient::new();
    let mut result = Some(result);
    chain
        .expect_fetch_deployed_bytecode()
        .times(1)
        .returning(move |_, _| result.take().unwrap().map(str::to_string));
    chain
}

#[tokio::test]
async fn test_verify_perfect_match() {
    let dir = tempfile::tempdir().unwrap();
    let services = start(&dir, chain_returning(Ok("0x60016002"))).await;

    let (status, body) = post_verify(services.api_server_address.unwrap(), request_body(verification_request())).await;

    assert_eq!(status, 200);
    assert_eq!(body.verified_status, VerificationStatus::Perfect);
    assert_eq!(body.message, "ok");
    assert_eq!(body.creation_bytecode_length, Some(COMPILED_CREATION.len()));
    assert_eq!(body.abi.map(|abi| abi.len()), Some(1));
}

#[tokio::test]
async fn test_verify_metadata_as_object() {
    let dir = tempfile::tempdir().unwrap();
    let services = start(&dir, chain_returning(Ok(COMPILED_DEPLOYED))).await;
    let mut body = request_body(verification_request());
    body["metadata"] = serde_json::from_str(body["metadata"].as_str().unwrap()).unwrap();

    let (status, body) = post_verify(services.api_server_address.unwrap(), body).await;

    assert_eq!(status, 200);
    assert_eq!(body.verified_status, VerificationStatus::Perfect);
}

#[tokio::test]
async fn test_verify_mismatch_is_200() {
    let dir = tempfile::tempdir().unwrap();
    let mut chain = chain_returning(Ok("0x60016003"));
    chain.expect_fetch_creation_bytecode().times(1).returning(|_, _| Ok("0x00".to_string()));
    let services = start(&dir, chain).await;

    let (status, body) = post_verify(services.api_server_address.unwrap(), request_body(verification_request())).await;

    assert_eq!(status, 200);
    assert_eq!(body, VerificationResponse::failure("bytecode mismatch"));
}

#[rstest]
#[case::not_found(Ok("0x"), 404)]
#[case::unsupported_chain(Err(ChainClientError::UnsupportedChain(1)), 404)]
#[case::rpc_failure(Err(ChainClientError::Rpc { chain_id: 1, message: "header not found".into() }), 502)]
#[tokio::test]
async fn test_verify_chain_failures(#[case] result: Result<&'static str, ChainClientError>, #[case] expected: u16) {
    let dir = tempfile::tempdir().unwrap();
    let services = start(&dir, chain_returning(result)).await;

    let (status, body) = post_verify(services.api_server_address.unwrap(), request_body(verification_request())).await;

    assert_eq!(status, expected);
    assert_eq!(body.verified_status, VerificationStatus::Mismatch);
    assert!(body.abi.is_none());
}

#[tokio::test]
async fn test_verify_invalid_address_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let services = start(&dir, MockChainClient::new()).await;
    let request = VerificationRequest { address: "not-an-address".into(), ..verification_request() };

    let (status, body) = post_verify(services.api_server_address.unwrap(), request_body(request)).await;

    assert_eq!(status, 400);
    assert_eq!(body, VerificationResponse::failure("invalid address"));
}

#[tokio::test]
async fn test_verify_malformed_body_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let services = start(&dir, MockChainClient::new()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/verify", services.api_server_address.unwrap()))
        .header("content-type", "application/json")
        .body("{\"address\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: VerificationResponse = response.json().await.unwrap();
    assert_eq!(body.verified_status, VerificationStatus::Mismatch);
}

#[tokio::test]
async fn test_verify_unknown_compiler_is_500() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET");
            then.status(404);
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let services = TestConfigBuilder::new(dir.path())
        .configure_chain_client(MockChainClient::new())
        .configure_download_base(server.url("/solc-"))
        .configure_api_server()
        .build()
        .await;
    let body = json!({
        "address": "0x32Be343B94f860124dC4fEe278FDCBD38C102D88",
        "metadata": "{}",
        "chain": 1,
        "compilerVersion": "0.8.99"
    });

    let (status, body) = post_verify(services.api_server_address.unwrap(), body).await;

    assert_eq!(status, 500);
    assert_eq!(body.verified_status, VerificationStatus::Mismatch);
    assert!(body.message.contains("v0.8.99"));
}
