use std::sync::Arc;

use async_trait::async_trait;
use tutorbot_core::{LlmRequest, Runnable, TutorError, Value};
use tutorbot_graph::{GraphState, StateUpdate};
use tutorbot_llm::Llm;
use tutorbot_prompt::ChatPromptTemplate;

use crate::prompts::final_answer_prompt;
use crate::ChatState;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct FinalAnswerNode {
    llm: Arc<dyn Llm>,
    temperature: f32,
    prompt: ChatPromptTemplate,
}

impl FinalAnswerNode {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_TEMPERATURE,
            prompt: final_answer_prompt(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Runnable<GraphState<ChatState>, StateUpdate<ChatState>> for FinalAnswerNode {
    async fn invoke(
        &self,
        input: GraphState<ChatState>,
    ) -> Result<StateUpdate<ChatState>, TutorError> {
        let mut state = input.data;
        let messages = self.prompt.format_with([
            ("input", Value::String(state.input.clone())),
            ("tool_results", serde_json::to_value(&state.tool_results)?),
        ])?;
        let reply = self
            .llm
            .invoke(LlmRequest::new(messages).with_temperature(self.temperature))
            .await?;

        state.output = Some(reply.content);
        Ok(StateUpdate::new(state))
    }
}
