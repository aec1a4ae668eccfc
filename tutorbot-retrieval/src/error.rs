use std::path::PathBuf;

use thiserror::Error;
use tutorbot_core::{EmbeddingError, StoreError};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension for '{0}'")]
    UnsupportedExtension(PathBuf),
    #[error("html parse error in '{path}': {reason}")]
    Html { path: PathBuf, reason: String },
    #[error("csv error in '{path}': {reason}")]
    Csv { path: PathBuf, reason: String },
    #[error("corpus directory '{0}' does not exist")]
    MissingCorpus(PathBuf),
    #[error("corpus directory '{0}' contains no supported documents")]
    EmptyCorpus(PathBuf),
}
