#![cfg(feature = "reqwest")]

use std::time::Duration;

use depot_fetch::{ReqwestClient, TransferEngine, TransferError, TransferOptions};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_downloads_over_http() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 256) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/packages/DEM-Agent/1.0/agent.tar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("DEM-Agent/1.0/agent.tar");
    let source = Url::parse(&format!("{}/packages/DEM-Agent/1.0/agent.tar", server.uri())).unwrap();
    let engine = TransferEngine::new(ReqwestClient::new(Duration::from_secs(5)).unwrap());

    let written = engine
        .copy(&source, &dest, &TransferOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
}

#[tokio::test]
async fn test_error_status_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("gone.tar");
    let source = Url::parse(&format!("{}/gone.tar", server.uri())).unwrap();
    let engine = TransferEngine::new(ReqwestClient::new(Duration::from_secs(5)).unwrap());

    let err = engine
        .copy(&source, &dest, &TransferOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Network(_)));
    assert!(!dest.exists());
}
