//! Integration tests for OpenAIClient.
//!
//! Uses wiremock for HTTP mocking. Covers request shape, the reasoning
//! fallback, and status mapping (401/400/429/5xx) through the judge.

use std::time::Duration;

use checkjudge_core::judge::JudgeClient;
use checkjudge_core::model::ChecklistItem;
use checkjudge_core::providers::llm::openai::OpenAIClient;
use checkjudge_core::providers::llm::LlmClient;
use checkjudge_core::JudgeError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenAIClient {
    OpenAIClient::new(
        &format!("{}/v1/", server.uri()),
        "judge-model".into(),
        "test-key".into(),
        0.1,
        2000,
    )
    .expect("failed to create client")
}

fn completion(content: serde_json::Value) -> serde_json::Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

fn item() -> ChecklistItem {
    ChecklistItem {
        title: "X".into(),
        description: "mentions the launch date".into(),
    }
}

#[tokio::test]
async fn posts_chat_completion_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "judge-model", "max_tokens": 2000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("Yes"))))
        .expect(1)
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.endpoint().ends_with("/v1/chat/completions"));
    let resp = c.complete("system", "prompt").await.expect("call failed");
    assert_eq!(resp.text, "Yes");
    assert_eq!(resp.provider, "openai");
}

#[tokio::test]
async fn judge_reads_verdict_from_reasoning_when_content_is_empty() {
    let server = MockServer::start().await;
    let reasoning = "No idea yet.\nline a\nline b\nline c\nline d\nThe date is present.\nYes";
    let body = json!({"choices": [{"message": {"content": "", "reasoning_content": reasoning}}]});
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let judge = JudgeClient::new(std::sync::Arc::new(client(&server)));
    let verdict = judge
        .evaluate("article text", &item(), Duration::from_secs(5))
        .await
        .unwrap();
    // only the last five lines are read, so the early "No" does not count
    assert_eq!(verdict.is_met, Some(true));
    assert!(verdict.answer.ends_with("Yes"));
}

#[tokio::test]
async fn unauthorized_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = client(&server).complete("s", "p").await.unwrap_err();
    assert_eq!(
        err,
        JudgeError::Unauthorized {
            status: 401,
            message: "invalid api key".into()
        }
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn bad_request_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("model not found"))
        .mount(&server)
        .await;

    let err = client(&server).complete("s", "p").await.unwrap_err();
    assert!(matches!(err, JudgeError::BadRequest { status: 400, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = client(&server).complete("s", "p").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server).complete("s", "p").await.unwrap_err();
    assert!(matches!(err, JudgeError::Server { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn undecodable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).complete("s", "p").await.unwrap_err();
    assert!(matches!(err, JudgeError::InvalidResponse { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_server_times_out_through_the_judge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!("Yes")))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let judge = JudgeClient::new(std::sync::Arc::new(client(&server)));
    let err = judge
        .evaluate("text", &item(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}
