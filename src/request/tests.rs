//! HTTP-level tests for `RequestClient` against local servers.

use super::*;
use crate::config::Config;
use mockito::{Matcher, Server};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Deserialize, PartialEq)]
struct Echo {
    ok: bool,
}

fn client_for(base_url: String) -> RequestClient {
    let config = Config {
        base_url,
        ..Config::default()
    };
    RequestClient::new(&config).unwrap()
}

/// Answers a single request only after `release` fires.
async fn held_server(release: oneshot::Receiver<()>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        let _ = release.await;
        let body = r#"{"ok":true}"#;
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Declares a longer body than it sends, then hangs up.
async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        let reply = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\nconnection: close\r\n\r\n{\"list\":";
        let _ = socket.write_all(reply.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn parses_json_and_sends_domain_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ping")
        .match_header("domain", "app.touchone.com.br")
        .with_status(200)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = client_for(server.url());
    let data: Option<Echo> = assert_ok!(client.send("/ping", RequestConfig::default()).await);

    assert_eq!(data, Some(Echo { ok: true }));
    assert_eq!(client.state(), RequestState::default());
    mock.assert_async().await;
}

#[tokio::test]
async fn caller_headers_override_defaults() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ping")
        .match_header("domain", "admin.touchone.com.br")
        .match_header("x-trace", "abc")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(server.url());
    let config = RequestConfig::get()
        .header("Domain", "admin.touchone.com.br")
        .header("X-Trace", "abc");
    let data: Option<Value> = assert_ok!(client.send("/ping", config).await);

    assert!(data.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn structured_body_is_serialized_with_json_content_type() {
    let payload = json!({ "segment": { "id": "9", "descricao": "Serviços de Beleza." }, "tags": [1, 2] });

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/perfil")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(payload.clone()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = client_for(server.url());
    let config = RequestConfig::post().body(RequestBody::Json(payload));
    let data: Option<Echo> = assert_ok!(client.send("/perfil", config).await);

    assert_eq!(data, Some(Echo { ok: true }));
    mock.assert_async().await;
}

#[tokio::test]
async fn raw_body_passes_through_without_json_content_type() {
    let form = "segmento=9&ativo=true";

    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/perfil")
        .match_header("content-type", Matcher::Missing)
        .match_body(form)
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(server.url());
    let config = RequestConfig::new(Method::Put).body(RequestBody::raw(form.as_bytes().to_vec()));
    let data: Option<Value> = assert_ok!(client.send("/perfil", config).await);

    assert!(data.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn non_json_reply_yields_no_data() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("up")
        .create_async()
        .await;

    let client = client_for(server.url());
    let data: Option<Value> = assert_ok!(client.send("/health", RequestConfig::default()).await);

    assert!(data.is_none());
    assert!(client.error().is_none());
}

#[tokio::test]
async fn error_status_becomes_transport_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/Segmento")
        .with_status(500)
        .create_async()
        .await;

    let client = client_for(server.url());
    let err = assert_err!(client.send::<Value>("/Segmento", RequestConfig::default()).await);

    assert_eq!(err, RequestError::Transport { status: 500 });
    assert_eq!(err.status(), Some(500));
    let state = client.state();
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("HTTP error! Status: 500"));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/Segmento")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"list\": [")
        .create_async()
        .await;

    let client = client_for(server.url());
    let err = assert_err!(client.send::<Value>("/Segmento", RequestConfig::default()).await);

    assert!(matches!(err, RequestError::Decode(_)));
    assert_eq!(client.error(), Some(err.to_string()));
}

#[tokio::test]
async fn truncated_body_after_success_is_a_decode_error() {
    let client = client_for(truncating_server().await);
    let err = assert_err!(client.send::<Value>("/Segmento", RequestConfig::default()).await);

    assert!(matches!(err, RequestError::Decode(_)), "got {:?}", err);
    assert_eq!(client.error(), Some(err.to_string()));
    assert!(!client.is_loading());
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{}", addr));
    let err = assert_err!(client.send::<Value>("/ping", RequestConfig::default()).await);

    assert!(matches!(err, RequestError::Network(_)));
    assert!(client.error().is_some());
    assert!(!client.is_loading());
}

#[tokio::test]
async fn invalid_header_is_reported_not_panicked() {
    let client = client_for("http://127.0.0.1:9".to_string());
    let config = RequestConfig::get().header("bad header", "x");
    let err = assert_err!(client.send::<Value>("/ping", config).await);

    assert!(matches!(err, RequestError::InvalidRequest(_)));
    assert!(!client.is_loading());
}

#[tokio::test]
async fn success_clears_previous_error() {
    let mut server = Server::new_async().await;
    let _fail = server
        .mock("GET", "/fail")
        .with_status(404)
        .create_async()
        .await;
    let _ok = server
        .mock("GET", "/ok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let client = client_for(server.url());
    assert_err!(client.send::<Echo>("/fail", RequestConfig::default()).await);
    assert_eq!(client.error().as_deref(), Some("HTTP error! Status: 404"));

    assert_ok!(client.send::<Echo>("/ok", RequestConfig::default()).await);
    assert_eq!(client.state(), RequestState::default());
}

#[tokio::test]
async fn loading_is_set_only_while_the_call_is_in_flight() {
    let (release, held) = oneshot::channel();
    let client = Arc::new(client_for(held_server(held).await));
    let mut states = client.subscribe();
    assert!(!client.is_loading());

    let task = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.send::<Echo>("/slow", RequestConfig::default()).await })
    };

    states.wait_for(|s| s.is_loading).await.unwrap();
    assert!(client.state().error.is_none());

    release.send(()).unwrap();
    let data = task.await.unwrap().unwrap();
    assert_eq!(data, Some(Echo { ok: true }));
    assert_eq!(client.state(), RequestState::default());
}

#[tokio::test]
async fn dropped_call_still_clears_loading() {
    let (_release, held) = oneshot::channel::<()>();
    let client = Arc::new(client_for(held_server(held).await));
    let mut states = client.subscribe();

    let task = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.send::<Echo>("/slow", RequestConfig::default()).await })
    };
    states.wait_for(|s| s.is_loading).await.unwrap();

    task.abort();
    let _ = task.await;
    assert!(!client.is_loading());
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/fail")
        .with_status(503)
        .create_async()
        .await;

    let root = client_for(server.url());
    let session = root.session();
    assert_eq!(session.base_url(), root.base_url());

    assert_err!(session.send::<Value>("/fail", RequestConfig::default()).await);
    assert!(session.error().is_some());
    assert_eq!(root.state(), RequestState::default());
}
