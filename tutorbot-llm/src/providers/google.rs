//! Google Gemini API LLM client

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tutorbot_core::{LlmRequest, LlmResponse, Message, Role, Runnable, TutorError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

#[derive(Clone)]
pub struct GoogleClient {
    base_url: String,
    api_key: Arc<SecretString>,
    model: String,
    timeout: Duration,
    http: Client,
}

impl fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GoogleClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: Arc::new(SecretString::new(api_key.into())),
            model: model.into(),
            timeout: Duration::from_secs(120),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_name(&self, request_model: &str) -> String {
        let model = if request_model.is_empty() {
            self.model.as_str()
        } else {
            request_model
        };
        model
            .trim()
            .strip_prefix("models/")
            .unwrap_or(model)
            .to_string()
    }

    fn generate_url(&self, request_model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name(request_model)
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
    }
}

fn map_contents(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .filter_map(|message| {
            let role = match message.role {
                Role::System => return None,
                Role::User => "user",
                Role::Assistant => "model",
            };
            Some(Content {
                role: Some(role.to_string()),
                parts: vec![text_part(&message.content)],
            })
        })
        .collect()
}

fn system_instruction(messages: &[Message]) -> Option<Content> {
    let parts: Vec<Part> = messages
        .iter()
        .filter(|message| matches!(message.role, Role::System))
        .map(|message| text_part(&message.content))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(Content { role: None, parts })
    }
}

fn build_request(input: &LlmRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: map_contents(&input.messages),
        system_instruction: system_instruction(&input.messages),
        generation_config: input
            .temperature
            .map(|temperature| GenerationConfig { temperature }),
    }
}

fn is_blocked_finish_reason(reason: &str) -> bool {
    matches!(reason, "SAFETY" | "RECITATION" | "BLOCKLIST")
}

fn candidate_text(candidate: Option<Content>) -> String {
    candidate
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<GoogleErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body))
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for GoogleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, TutorError> {
        let request = build_request(&input);

        let response = self
            .http
            .post(self.generate_url(&input.model))
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|err| TutorError::LlmProvider(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TutorError::LlmProvider(error_message(response).await));
        }

        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| TutorError::LlmProvider(err.to_string()))?;

        let candidate = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or_else(|| TutorError::LlmProvider("No candidates in response".to_string()))?;

        let finish_reason = candidate.finish_reason.clone();
        let text = candidate_text(candidate.content);

        if text.is_empty()
            && finish_reason
                .as_deref()
                .map(is_blocked_finish_reason)
                .unwrap_or(false)
        {
            let reason = finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(TutorError::LlmProvider(format!(
                "Generation blocked: {}",
                reason
            )));
        }

        Ok(LlmResponse { content: text })
    }
}
