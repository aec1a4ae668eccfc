use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("Tool call failed for '{tool_name}': {reason}")]
    ToolCallFailed { tool_name: String, reason: String },
    #[error("Retrieval failed: {0}")]
    Retrieval(String),
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl From<EmbeddingError> for TutorError {
    fn from(err: EmbeddingError) -> Self {
        TutorError::Retrieval(err.to_string())
    }
}

impl From<StoreError> for TutorError {
    fn from(err: StoreError) -> Self {
        TutorError::Retrieval(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding invalid response: {0}")]
    InvalidResponse(String),
    #[error("Embedding rate limited (retry_after={})", retry_after_label(.retry_after))]
    RateLimited { retry_after: Option<Duration> },
    #[error("Embedding provider error: {0}")]
    Provider(String),
    #[error("Embedding error: {0}")]
    Other(#[source] Box<dyn StdError + Send + Sync>),
}

fn retry_after_label(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(duration) => format!("{duration:?}"),
        None => "unknown".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("document '{0}' is missing an embedding")]
    MissingEmbedding(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
