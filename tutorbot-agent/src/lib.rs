//! The tutorbot chat workflow.
//!
//! A request enters the router, which asks the model for one label:
//! `rag_retriever`, `code_interpreter` or `final_answer`. The matching tool
//! node runs (if any) and the final-answer node writes `output`.

pub mod adapters;
mod agent;
mod error;
mod events;
pub mod nodes;
pub mod prompts;
mod state;

pub use agent::{ChatAgent, ChatAgentBuilder};
pub use error::AgentError;
pub use events::{chunk_answer, ChatEvent, ANSWER_CHUNK_CHARS};
pub use state::{ChatState, Route, ToolCallRecord, ToolKind, ToolResultRecord};
