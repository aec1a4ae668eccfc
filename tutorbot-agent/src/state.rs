use serde::{Deserialize, Serialize};
use tutorbot_core::Value;
use tutorbot_graph::StateSchema;

/// Optional tools the router can dispatch to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    RagRetriever,
    CodeInterpreter,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::RagRetriever => "rag_retriever",
            ToolKind::CodeInterpreter => "code_interpreter",
        }
    }

    /// One-line description shown to the router model.
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::RagRetriever => {
                "search the scikit-learn, pandas, NumPy and related ML / data-science documentation"
            }
            ToolKind::CodeInterpreter => {
                "run the Python code contained in the input and explain its output or error"
            }
        }
    }
}

/// Routing decision; each variant is also the name of the graph node it leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    RagRetriever,
    CodeInterpreter,
    FinalAnswer,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::RagRetriever => "rag_retriever",
            Route::CodeInterpreter => "code_interpreter",
            Route::FinalAnswer => "final_answer",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "rag_retriever" => Some(Route::RagRetriever),
            "code_interpreter" => Some(Route::CodeInterpreter),
            "final_answer" => Some(Route::FinalAnswer),
            _ => None,
        }
    }

    pub fn tool(&self) -> Option<ToolKind> {
        match self {
            Route::RagRetriever => Some(ToolKind::RagRetriever),
            Route::CodeInterpreter => Some(ToolKind::CodeInterpreter),
            Route::FinalAnswer => None,
        }
    }
}

impl From<ToolKind> for Route {
    fn from(tool: ToolKind) -> Self {
        match tool {
            ToolKind::RagRetriever => Route::RagRetriever,
            ToolKind::CodeInterpreter => Route::CodeInterpreter,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: ToolKind,
    pub input: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResultRecord {
    pub tool: ToolKind,
    pub output: Value,
}

/// The record that flows through the chat workflow and is returned to clients.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub input: String,
    /// Set once, by the final-answer node.
    pub output: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
    pub next_step: Option<Route>,
    /// Invalid router labels seen so far; never exceeds the router's retry limit.
    pub retry_count: u32,
}

impl StateSchema for ChatState {}

impl ChatState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn record_call(&mut self, tool: ToolKind, input: impl Into<String>) {
        self.tool_calls.push(ToolCallRecord {
            tool,
            input: input.into(),
        });
    }

    pub fn record_result(&mut self, tool: ToolKind, output: Value) {
        self.tool_results.push(ToolResultRecord { tool, output });
    }
}
