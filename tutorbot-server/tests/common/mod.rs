#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tutorbot_agent::ChatAgent;
use tutorbot_core::{LlmRequest, LlmResponse, Runnable, TutorError};
use tutorbot_server::{app, AppState};

/// Replays canned replies; an exhausted script fails like a provider error.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, TutorError>>>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(|reply| Ok(reply.into())).collect(),
            )),
        }
    }

    pub fn failing(message: &str) -> Self {
        let llm = Self::default();
        llm.replies
            .lock()
            .unwrap()
            .push_back(Err(TutorError::LlmProvider(message.to_string())));
        llm
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for ScriptedLlm {
    async fn invoke(&self, _input: LlmRequest) -> Result<LlmResponse, TutorError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorError::LlmProvider("script exhausted".to_string())));
        reply.map(|content| LlmResponse { content })
    }
}

/// Answers every request, but only after `delay`.
pub struct SlowLlm(pub Duration);

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for SlowLlm {
    async fn invoke(&self, _input: LlmRequest) -> Result<LlmResponse, TutorError> {
        tokio::time::sleep(self.0).await;
        Ok(LlmResponse {
            content: "final_answer".to_string(),
        })
    }
}

pub fn router_with(llm: ScriptedLlm) -> axum::Router {
    let agent = ChatAgent::builder()
        .with_llm(Arc::new(llm))
        .build()
        .unwrap();
    app(AppState::new(agent), 4)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
