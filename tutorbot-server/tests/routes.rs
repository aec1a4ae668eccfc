mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use common::{body_string, get, router_with, ScriptedLlm, SlowLlm};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tutorbot_agent::ChatAgent;
use tutorbot_server::{app, execution_config, AppState, ServerConfig};

#[tokio::test]
async fn health_reports_ok() {
    let response = router_with(ScriptedLlm::default())
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn chat_returns_final_state_as_json() {
    let llm = ScriptedLlm::new(["final_answer", "Pandas is a dataframe library."]);
    let response = router_with(llm)
        .oneshot(get("/chat?input=What%20is%20pandas%3F"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["input"], "What is pandas?");
    assert_eq!(body["output"], "Pandas is a dataframe library.");
    assert_eq!(body["next_step"], "final_answer");
    assert_eq!(body["retry_count"], 0);
    assert_eq!(body["tool_calls"], serde_json::json!([]));
    assert_eq!(body["tool_results"], serde_json::json!([]));
}

#[tokio::test]
async fn chat_rejects_blank_input() {
    let response = router_with(ScriptedLlm::default())
        .oneshot(get("/chat?input=%20%20"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("input"));
}

#[tokio::test]
async fn chat_rejects_missing_input() {
    let response = router_with(ScriptedLlm::default())
        .oneshot(get("/chat"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway() {
    let response = router_with(ScriptedLlm::failing("quota exceeded"))
        .oneshot(get("/chat?input=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn request_past_the_timeout_is_a_gateway_timeout() {
    let mut config = ServerConfig::new(SecretString::new("test-key".to_string()));
    config.request_timeout = Duration::from_millis(50);
    let agent = ChatAgent::builder()
        .with_llm(Arc::new(SlowLlm(Duration::from_secs(5))))
        .with_execution_config(execution_config(&config))
        .build()
        .unwrap();

    let response = app(AppState::new(agent), 4)
        .oneshot(get("/chat?input=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn stream_emits_state_chunks_and_done() {
    let llm = ScriptedLlm::new(["final_answer", "Use numpy arrays."]);
    let response = router_with(llm)
        .oneshot(get("/chat/stream?input=arrays"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = body_string(response).await;
    let status = body.find("event: status").unwrap();
    let state = body.find("event: state").unwrap();
    let chunk = body.find("event: chunk").unwrap();
    let done = body.find("event: done").unwrap();
    assert!(status < state && state < chunk && chunk < done);
    assert!(body.contains(r#""next_step":"final_answer""#));
    assert!(body.contains(r#"{"content":"Use n"}"#));
    assert!(!body.contains("event: error"));
}

#[tokio::test]
async fn stream_reports_failures_as_error_event() {
    let response = router_with(ScriptedLlm::failing("upstream unavailable"))
        .oneshot(get("/chat/stream?input=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("event: error"));
    assert!(body.contains("upstream unavailable"));
    assert!(!body.contains("event: done"));
}

#[tokio::test]
async fn stream_rejects_blank_input_before_streaming() {
    let response = router_with(ScriptedLlm::default())
        .oneshot(get("/chat/stream?input="))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
