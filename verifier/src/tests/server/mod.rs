pub mod verify_routes;

use std::net::SocketAddr;

use rstest::*;

use crate::server::types::ApiResponse;
use crate::tests::config::TestConfigBuilder;

#[fixture]
async fn setup_server() -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let services = TestConfigBuilder::new(dir.path()).configure_api_server().build().await;
    (services.api_server_address.unwrap(), dir)
}

#[rstest]
#[tokio::test]
async fn test_health_endpoint(#[future] setup_server: (SocketAddr, tempfile::TempDir)) {
    let (addr, _dir) = setup_server.await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "UP");
}

#[rstest]
#[tokio::test]
async fn test_unknown_route_is_404(#[future] setup_server: (SocketAddr, tempfile::TempDir)) {
    let (addr, _dir) = setup_server.await;

    let response = reqwest::get(format!("http://{}/contracts", addr)).await.unwrap();

    assert_eq!(response.status(), 404);
    let body: ApiResponse = response.json().await.unwrap();
    assert!(!body.success);
}

#[rstest]
#[tokio::test]
async fn test_verify_rejects_get(#[future] setup_server: (SocketAddr, tempfile::TempDir)) {
    let (addr, _dir) = setup_server.await;

    let response = reqwest::get(format!("http://{}/verify", addr)).await.unwrap();

    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_shutdown_stops_listening() {
    let dir = tempfile::tempdir().unwrap();
    let services = TestConfigBuilder::new(dir.path()).configure_api_server().build().await;
    let addr = services.api_server_address.unwrap();

    services.server_handle.unwrap().shutdown().await.unwrap();

    assert!(reqwest::get(format!("http://{}/health", addr)).await.is_err());
}
