//! Integration tests for the streaming download engine

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nlm::download::download_url;
use nlm::error::NlmError;

fn plain_client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_successful_download_writes_destination() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("artifact.bin");

    let body = vec![0xABu8; 200_000];
    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let mut observed: Vec<(u64, u64)> = Vec::new();
    let mut progress = |downloaded: u64, total: u64| observed.push((downloaded, total));

    let url = format!("{}/artifact", server.uri());
    let saved = download_url(&plain_client(), &url, &dest, Some(&mut progress))
        .await
        .unwrap();

    assert_eq!(saved, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!dir.path().join("artifact.bin.tmp").exists());

    // Progress was reported and ended at the full size.
    assert!(!observed.is_empty());
    assert_eq!(observed.last().unwrap().0, 200_000);
    assert_eq!(observed.last().unwrap().1, 200_000);
}

#[tokio::test]
async fn test_login_page_response_raises_auth_error_and_cleans_up() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("audio.m4a");

    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<!DOCTYPE html><html><body>Sign in to continue</body></html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/artifact", server.uri());
    let err = download_url(&plain_client(), &url, &dest, None)
        .await
        .unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::Authentication(msg)) => assert!(msg.contains("login")),
        other => panic!("expected Authentication, got {:?}", other),
    }
    assert!(!dest.exists());
    assert!(!dir.path().join("audio.m4a.tmp").exists());
}

#[tokio::test]
async fn test_non_login_html_is_downloaded_normally() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("page.html");

    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<table><tr><td>exported data</td></tr></table>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/artifact", server.uri());
    download_url(&plain_client(), &url, &dest, None).await.unwrap();
    assert!(std::fs::read_to_string(&dest)
        .unwrap()
        .contains("exported data"));
}

#[tokio::test]
async fn test_http_error_leaves_no_files_behind() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("deck.pdf");

    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/artifact", server.uri());
    let err = download_url(&plain_client(), &url, &dest, None)
        .await
        .unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::ArtifactDownload { .. }) => {}
        other => panic!("expected ArtifactDownload, got {:?}", other),
    }
    assert!(!dest.exists());
    assert!(!dir.path().join("deck.pdf.tmp").exists());
}

/// An interrupted transfer must not corrupt the destination: the failed
/// attempt leaves nothing behind, and a later successful download to the
/// same path is fully readable.
#[tokio::test]
async fn test_interrupted_transfer_then_successful_retry() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("video.mp4");

    // Connection-level failure mid-operation (unroutable port).
    let dead_url = "http://127.0.0.1:1/artifact";
    let err = download_url(&plain_client(), dead_url, &dest, None)
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<NlmError>().is_some());
    assert!(!dest.exists());
    assert!(!dir.path().join("video.mp4.tmp").exists());

    Mock::given(method("GET"))
        .and(path("/artifact"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(&server)
        .await;

    let url = format!("{}/artifact", server.uri());
    download_url(&plain_client(), &url, &dest, None).await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");
}
