#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tutorbot_core::{LlmRequest, LlmResponse, Role, Runnable, Tool, ToolError, TutorError, Value};

/// LLM double that replays canned replies in order and records every request.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<String, TutorError>>>>,
    pub requests: Arc<Mutex<Vec<LlmRequest>>>,
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
            requests: Arc::default(),
        }
    }

    pub fn push_error(&self, error: TutorError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> LlmRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn user_text(&self, index: usize) -> String {
        self.request(index)
            .messages
            .into_iter()
            .filter(|message| message.role == Role::User)
            .map(|message| message.content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for ScriptedLlm {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, TutorError> {
        self.requests.lock().unwrap().push(input);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorError::LlmProvider("script exhausted".to_string())));
        reply.map(|content| LlmResponse { content })
    }
}

/// Interpreter double that records the code it was asked to run.
#[derive(Clone, Default)]
pub struct FakeInterpreter {
    pub received: Arc<Mutex<Vec<Value>>>,
}

#[async_trait::async_trait]
impl Tool for FakeInterpreter {
    fn name(&self) -> &str {
        "fake_interpreter"
    }

    fn description(&self) -> &str {
        "records code instead of running it"
    }

    fn schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        self.received.lock().unwrap().push(args);
        Ok(json!({ "stdout": "2\n", "stderr": "", "exit_code": 0, "timed_out": false }))
    }
}

pub struct BrokenInterpreter;

#[async_trait::async_trait]
impl Tool for BrokenInterpreter {
    fn name(&self) -> &str {
        "broken_interpreter"
    }

    fn description(&self) -> &str {
        "always fails to start"
    }

    fn schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn invoke(&self, _args: Value) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionFailed("failed to start 'python3'".to_string()))
    }
}

pub fn write_corpus(dir: &std::path::Path) {
    std::fs::write(
        dir.join("svm.md"),
        "# Support Vector Machines\n\nSVC separates classes with a maximum margin hyperplane.",
    )
    .unwrap();
    std::fs::write(
        dir.join("pandas.txt"),
        "A pandas DataFrame is a two dimensional labeled table.",
    )
    .unwrap();
}
