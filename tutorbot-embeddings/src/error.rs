use thiserror::Error;
use tutorbot_core::EmbeddingError;

#[derive(Debug, Error)]
pub enum EmbeddingProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<EmbeddingProviderError> for EmbeddingError {
    fn from(error: EmbeddingProviderError) -> Self {
        match error {
            EmbeddingProviderError::InvalidResponse(message) => {
                EmbeddingError::InvalidResponse(message)
            }
            EmbeddingProviderError::Http { status: 429, .. } => {
                EmbeddingError::RateLimited { retry_after: None }
            }
            other => EmbeddingError::Provider(other.to_string()),
        }
    }
}
