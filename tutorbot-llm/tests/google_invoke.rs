use httpmock::prelude::*;
use serde_json::json;
use tutorbot_core::{Runnable, TutorError};
use tutorbot_llm::{GoogleClient, LlmRequest, Message};

#[tokio::test]
async fn google_invoke_maps_text_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent")
            .query_param("key", "test-key")
            .json_body(json!({
                "contents": [
                    {
                        "role": "user",
                        "parts": [{"text": "hi"}]
                    }
                ]
            }));
        then.status(200).json_body(json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {"text": "hel"},
                            {"text": "lo"}
                        ]
                    },
                    "finishReason": "STOP"
                }
            ]
        }));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let request = LlmRequest::new(vec![Message::user("hi")]);

    let response = client.invoke(request).await.unwrap();
    assert_eq!(response.content, "hello");
    mock.assert();
}

#[tokio::test]
async fn google_invoke_folds_system_messages_and_sends_temperature() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent")
            .query_param("key", "test-key")
            .json_body(json!({
                "systemInstruction": {
                    "parts": [
                        {"text": "You are a router."}
                    ]
                },
                "contents": [
                    {
                        "role": "user",
                        "parts": [{"text": "Input: plot a sine wave"}]
                    }
                ],
                "generationConfig": {
                    "temperature": 0.0
                }
            }));
        then.status(200).json_body(json!({
            "candidates": [
                {
                    "content": {
                        "parts": [{"text": "code_interpreter"}]
                    },
                    "finishReason": "STOP"
                }
            ]
        }));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let request = LlmRequest::new(vec![
        Message::system("You are a router."),
        Message::user("Input: plot a sine wave"),
    ])
    .with_temperature(0.0);

    let response = client.invoke(request).await.unwrap();
    assert_eq!(response.content, "code_interpreter");
    mock.assert();
}

#[tokio::test]
async fn google_invoke_uses_request_model_override() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-pro:generateContent");
        then.status(200).json_body(json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        }));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let mut request = LlmRequest::new(vec![Message::user("hi")]);
    request.model = "models/gemini-2.5-pro".to_string();

    let response = client.invoke(request).await.unwrap();
    assert_eq!(response.content, "ok");
    mock.assert();
}

#[tokio::test]
async fn google_invoke_returns_error_for_blocked_finish_reason_without_content() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent")
            .query_param("key", "test-key");
        then.status(200).json_body(json!({
            "candidates": [
                {
                    "content": {
                        "parts": []
                    },
                    "finishReason": "SAFETY"
                }
            ]
        }));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let request = LlmRequest::new(vec![Message::user("forbidden")]);

    let err = client.invoke(request).await.unwrap_err();
    assert!(matches!(err, TutorError::LlmProvider(message) if message.contains("SAFETY")));
}

#[tokio::test]
async fn google_invoke_errors_without_candidates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent");
        then.status(200).json_body(json!({}));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let err = client
        .invoke(LlmRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, TutorError::LlmProvider(message) if message.contains("No candidates")));
}

#[tokio::test]
async fn google_invoke_surfaces_rate_limit_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent")
            .query_param("key", "test-key");
        then.status(429).json_body(json!({
            "error": {
                "message": "quota exceeded"
            }
        }));
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let err = client
        .invoke(LlmRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, TutorError::LlmProvider(message) if message.contains("quota exceeded"))
    );
}

#[tokio::test]
async fn google_invoke_reports_status_for_non_json_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.5-flash-lite:generateContent");
        then.status(503).body("upstream unavailable");
    });

    let client =
        GoogleClient::new("test-key", "gemini-2.5-flash-lite").with_base_url(server.url(""));
    let err = client
        .invoke(LlmRequest::new(vec![Message::user("hi")]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, TutorError::LlmProvider(message) if message.contains("503") && message.contains("upstream unavailable"))
    );
}
