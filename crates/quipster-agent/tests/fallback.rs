//! Integration tests for the inference client's fallback behaviour.
//!
//! A wiremock server stands in for the provider; each candidate model gets
//! its own path so the tests can assert exactly which models were called.

use std::time::Duration;

use quipster_agent::{AgentError, InferenceClient, InferenceConfig, PromptBuilder};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, primary: &str, fallbacks: &[&str]) -> InferenceClient {
    let config = InferenceConfig::huggingface("hf_test", primary)
        .with_base_url(server.uri())
        .with_fallbacks(fallbacks.iter().copied())
        .with_timeout(Duration::from_millis(300));
    InferenceClient::new(config).unwrap()
}

async fn mount(server: &MockServer, model: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{model}")))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

// ═══════════════════════════════════════════════════════════════════════
//  Ordering
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn not_found_falls_through_to_next_candidate() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(404).set_body_string("Not Found"), 1).await;
    mount(
        &server,
        "b",
        ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": " from b " }])),
        1,
    )
    .await;
    mount(&server, "c", ResponseTemplate::new(200), 0).await;

    let client = client(&server, "a", &["b", "c"]);
    let request = PromptBuilder::default().build("hi");
    let text = client.generate(&request).await.unwrap();

    assert_eq!(text, "from b");
}

#[tokio::test]
async fn server_error_and_timeout_fall_through() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(503).set_body_string("busy"), 1).await;
    mount(
        &server,
        "b",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "generated_text": "too late" }))
            .set_delay(Duration::from_secs(2)),
        1,
    )
    .await;
    mount(
        &server,
        "c",
        ResponseTemplate::new(200).set_body_json(json!({ "generated_text": "c wins" })),
        1,
    )
    .await;

    let client = client(&server, "a", &["b", "c"]);
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();

    assert_eq!(text, "c wins");
}

#[tokio::test]
async fn primary_listed_in_fallbacks_is_called_once() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(500), 1).await;
    mount(
        &server,
        "b",
        ResponseTemplate::new(200).set_body_json(json!({ "generated_text": "ok" })),
        1,
    )
    .await;

    let client = client(&server, "a", &["a", "b", "a"]);
    assert_eq!(client.candidates(), ["a", "b"]);
    assert_eq!(
        client.generate(&PromptBuilder::default().build("hi")).await.unwrap(),
        "ok"
    );
}

// ═══════════════════════════════════════════════════════════════════════
//  Fast-fail and exhaustion
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unauthorized_stops_without_trying_others() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(401).set_body_string("bad token"), 1).await;
    mount(&server, "b", ResponseTemplate::new(200), 0).await;

    let client = client(&server, "a", &["b"]);
    let err = client
        .generate(&PromptBuilder::default().build("hi"))
        .await
        .unwrap_err();

    match err {
        AgentError::ProviderError { model, status, body } => {
            assert_eq!(model, "a");
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_stops_without_trying_others() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(403), 1).await;
    mount(&server, "b", ResponseTemplate::new(200), 0).await;

    let client = client(&server, "a", &["b"]);
    let err = client
        .generate(&PromptBuilder::default().build("hi"))
        .await
        .unwrap_err();
    assert!(err.is_fatal_for_all_candidates());
}

#[tokio::test]
async fn all_candidates_failing_is_exhaustion_with_last_error() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(500).set_body_string("first"), 1).await;
    mount(&server, "b", ResponseTemplate::new(502).set_body_string("second"), 1).await;

    let client = client(&server, "a", &["b"]);
    let err = client
        .generate(&PromptBuilder::default().build("hi"))
        .await
        .unwrap_err();

    match err {
        AgentError::InferenceExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, AgentError::ProviderError { status: 502, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn long_error_bodies_are_truncated() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(500).set_body_string("e".repeat(2000)), 1).await;

    let client = client(&server, "a", &[]);
    let err = client
        .generate_with_model("a", &PromptBuilder::default().build("hi"))
        .await
        .unwrap_err();
    match err {
        AgentError::ProviderError { body, .. } => assert_eq!(body.len(), 400),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Response shapes
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn loading_error_is_returned_without_retry() {
    let server = MockServer::start().await;
    mount(
        &server,
        "a",
        ResponseTemplate::new(200).set_body_json(json!({ "error": "Model a is currently loading" })),
        1,
    )
    .await;
    mount(&server, "b", ResponseTemplate::new(200), 0).await;

    let client = client(&server, "a", &["b"]);
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();
    assert_eq!(text, "[model/queue] Model a is currently loading");
}

#[tokio::test]
async fn unknown_json_shape_degrades_to_raw_text() {
    let server = MockServer::start().await;
    mount(
        &server,
        "a",
        ResponseTemplate::new(200).set_body_json(json!({ "summary_text": "odd" })),
        1,
    )
    .await;
    mount(&server, "b", ResponseTemplate::new(200), 0).await;

    let client = client(&server, "a", &["b"]);
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();
    assert_eq!(text, r#"{"summary_text":"odd"}"#);
}

#[tokio::test]
async fn non_json_body_degrades_to_raw_text() {
    let server = MockServer::start().await;
    mount(
        &server,
        "a",
        ResponseTemplate::new(200).set_body_string("  plain words \n"),
        1,
    )
    .await;

    let client = client(&server, "a", &[]);
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();
    assert_eq!(text, "plain words");
}

// ═══════════════════════════════════════════════════════════════════════
//  Wire format
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sends_bearer_token_and_completion_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/org/model"))
        .and(header("authorization", "Bearer hf_test"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "parameters": { "max_new_tokens": 220, "return_full_text": false },
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "ok" }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, "org/model", &[]);
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn openai_compatible_provider_shares_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "small" })))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "large" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "chat reply" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config =
        InferenceConfig::openai_compatible("sk-test", "small", format!("{}/v1", server.uri()))
            .with_fallbacks(["large"]);
    let client = InferenceClient::new(config).unwrap();
    let text = client.generate(&PromptBuilder::default().build("hi")).await.unwrap();
    assert_eq!(text, "chat reply");
}

#[tokio::test]
async fn probe_reports_status_without_failing() {
    let server = MockServer::start().await;
    mount(&server, "a", ResponseTemplate::new(404).set_body_string("missing model"), 1).await;

    let client = client(&server, "a", &["b"]);
    let report = client.probe().await.unwrap();
    assert_eq!(report.model, "a");
    assert_eq!(report.status, 404);
    assert!(!report.ok);
    assert_eq!(report.body_snippet, "missing model");
    assert_eq!(report.url, format!("{}/models/a", server.uri()));
}
