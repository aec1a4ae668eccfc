use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tutorbot_core::{LlmRequest, Runnable, Tool, TutorError, Value};
use tutorbot_graph::{GraphState, StateUpdate};
use tutorbot_llm::Llm;
use tutorbot_prompt::ChatPromptTemplate;

use crate::prompts::{code_explain_prompt, code_split_prompt, MISSING_DESCRIPTION};
use crate::{ChatState, ToolKind};

const SEPARATOR: &str = " / ";

/// Splits a `code / description` reply on the last separator and strips any
/// Markdown code fence around the code.
pub fn split_code_reply(reply: &str) -> (String, String) {
    let (code, description) = match reply.rsplit_once(SEPARATOR) {
        Some((code, description)) => (code, description.trim()),
        None => (reply, ""),
    };
    let description = if description.is_empty() {
        MISSING_DESCRIPTION
    } else {
        description
    };
    (strip_code_fence(code), description.to_string())
}

fn strip_code_fence(code: &str) -> String {
    let code = code.trim();
    let Some(rest) = code.strip_prefix("```") else {
        return code.to_string();
    };
    // A multi-line fence may carry an info string (```python) on its first line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Extracts code from the input, runs it, and asks the model to explain the
/// outcome. A failing or timed-out script is explained, not treated as an error.
pub struct CodeInterpreterNode {
    llm: Arc<dyn Llm>,
    interpreter: Arc<dyn Tool>,
    split_prompt: ChatPromptTemplate,
    explain_prompt: ChatPromptTemplate,
}

impl CodeInterpreterNode {
    pub fn new(llm: Arc<dyn Llm>, interpreter: Arc<dyn Tool>) -> Self {
        Self {
            llm,
            interpreter,
            split_prompt: code_split_prompt(),
            explain_prompt: code_explain_prompt(),
        }
    }

    async fn complete(&self, request: LlmRequest) -> Result<String, TutorError> {
        Ok(self.llm.invoke(request).await?.content)
    }
}

#[async_trait]
impl Runnable<GraphState<ChatState>, StateUpdate<ChatState>> for CodeInterpreterNode {
    async fn invoke(
        &self,
        input: GraphState<ChatState>,
    ) -> Result<StateUpdate<ChatState>, TutorError> {
        let mut state = input.data;
        state.record_call(ToolKind::CodeInterpreter, state.input.clone());

        let messages = self
            .split_prompt
            .format_with([("input", Value::String(state.input.clone()))])?;
        let reply = self
            .complete(LlmRequest::new(messages).with_temperature(0.0))
            .await?;
        let (code, description) = split_code_reply(&reply);

        let execution = self
            .interpreter
            .invoke(json!({ "code": code }))
            .await
            .map_err(|err| TutorError::ToolCallFailed {
                tool_name: self.interpreter.name().to_string(),
                reason: err.to_string(),
            })?;
        tracing::info!(
            exit_code = ?execution.get("exit_code"),
            timed_out = ?execution.get("timed_out"),
            "executed code snippet"
        );

        let messages = self.explain_prompt.format_with([
            ("input", Value::String(state.input.clone())),
            ("code", Value::String(code)),
            ("description", Value::String(description)),
            ("execution", execution),
        ])?;
        let explanation = self
            .complete(LlmRequest::new(messages).with_temperature(0.0))
            .await?;

        state.record_result(ToolKind::CodeInterpreter, Value::String(explanation));
        Ok(StateUpdate::new(state))
    }
}
