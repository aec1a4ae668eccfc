mod document;
mod embedding;
mod error;
mod llm;
mod runnable;
mod tool;
mod vector_store;

pub use document::Document;
pub use embedding::Embedding;
pub use error::{EmbeddingError, StoreError, TutorError};
pub use llm::{LlmRequest, LlmResponse, Message, Role};
pub use runnable::Runnable;
pub use tool::{Tool, ToolError};
pub use vector_store::{SearchResult, VectorStore};

pub type Value = serde_json::Value;
