use std::sync::Arc;

use async_trait::async_trait;
use tutorbot_core::{LlmRequest, Runnable, TutorError, Value};
use tutorbot_graph::{GraphState, StateUpdate};
use tutorbot_llm::Llm;
use tutorbot_prompt::ChatPromptTemplate;

use crate::prompts::router_prompt;
use crate::{ChatState, Route, ToolKind};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Trims whitespace and surrounding quotes or backticks, then lowercases.
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_lowercase()
}

/// Asks the model which tool, if any, should handle the input.
///
/// An unknown label (or one naming a tool that is not configured) is retried
/// up to `max_retries` times, incrementing `retry_count` each time; after that
/// the router gives up and routes to the final answer. Provider errors are
/// returned as-is without retrying.
pub struct RouterNode {
    llm: Arc<dyn Llm>,
    tools: Vec<ToolKind>,
    max_retries: u32,
    prompt: ChatPromptTemplate,
}

impl RouterNode {
    pub fn new(llm: Arc<dyn Llm>, tools: Vec<ToolKind>) -> Self {
        Self {
            llm,
            tools,
            max_retries: DEFAULT_MAX_RETRIES,
            prompt: router_prompt(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn labels(&self) -> Vec<&'static str> {
        self.tools
            .iter()
            .map(ToolKind::as_str)
            .chain(std::iter::once(Route::FinalAnswer.as_str()))
            .collect()
    }

    fn parse(&self, reply: &str) -> Option<Route> {
        let route = Route::from_label(&normalize_label(reply))?;
        match route.tool() {
            Some(tool) if !self.tools.contains(&tool) => None,
            _ => Some(route),
        }
    }
}

#[async_trait]
impl Runnable<GraphState<ChatState>, StateUpdate<ChatState>> for RouterNode {
    async fn invoke(
        &self,
        input: GraphState<ChatState>,
    ) -> Result<StateUpdate<ChatState>, TutorError> {
        let mut state = input.data;
        state.tool_calls.clear();
        state.tool_results.clear();
        state.next_step = None;
        state.retry_count = 0;

        let tools = self
            .tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.as_str(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let messages = self.prompt.format_with([
            ("input", Value::String(state.input.clone())),
            ("tools", Value::String(tools)),
            ("labels", Value::String(self.labels().join(", "))),
        ])?;

        let route = loop {
            let request = LlmRequest::new(messages.clone()).with_temperature(0.0);
            let reply = self.llm.invoke(request).await?;
            if let Some(route) = self.parse(&reply.content) {
                tracing::info!(
                    route = route.as_str(),
                    retries = state.retry_count,
                    "router picked a route"
                );
                break route;
            }
            if state.retry_count < self.max_retries {
                state.retry_count += 1;
                tracing::warn!(
                    label = %reply.content.trim(),
                    retry = state.retry_count,
                    max_retries = self.max_retries,
                    "router returned an invalid label, retrying"
                );
            } else {
                tracing::error!(
                    label = %reply.content.trim(),
                    retries = state.retry_count,
                    "router kept returning invalid labels, falling back to final_answer"
                );
                break Route::FinalAnswer;
            }
        };

        state.next_step = Some(route);
        Ok(StateUpdate::new(state))
    }
}
