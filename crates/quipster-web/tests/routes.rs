//! Integration tests for the HTTP routes, served on an ephemeral port.

use std::time::Duration;

use quipster_agent::{InferenceClient, InferenceConfig};
use quipster_web::{WebConfig, WebServer};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start the server for `base_url` and return its `http://host:port`.
async fn spawn_server(base_url: String) -> String {
    let config = InferenceConfig::huggingface("hf_test", "a")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(2));
    let client = InferenceClient::new(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = WebServer::new(WebConfig::default(), client);
    tokio::spawn(server.serve(listener));

    format!("http://{addr}")
}

#[tokio::test]
async fn health_returns_ok() {
    let base = spawn_server("http://127.0.0.1:9".into()).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn probe_reports_provider_status() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/a"))
        .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(1000)))
        .expect(1)
        .mount(&provider)
        .await;
    let base = spawn_server(provider.uri()).await;

    let resp = reqwest::get(format!("{base}/probe")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["model"], "a");
    assert_eq!(body["status"], 503);
    assert_eq!(body["ok"], false);
    assert_eq!(body["body_snippet"].as_str().unwrap().len(), 300);
    assert!(body["checked_at"].is_string());
}

#[tokio::test]
async fn probe_ok_on_success() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "pong" }])))
        .mount(&provider)
        .await;
    let base = spawn_server(provider.uri()).await;

    let body: Value = reqwest::get(format!("{base}/probe"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], 200);
}

#[tokio::test]
async fn probe_transport_failure_is_500() {
    let base = spawn_server("http://127.0.0.1:9".into()).await;

    let resp = reqwest::get(format!("{base}/probe")).await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("transport error"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let base = spawn_server("http://127.0.0.1:9".into()).await;

    let resp = reqwest::get(format!("{base}/nope")).await.unwrap();
    assert_eq!(resp.status(), 404);
}
