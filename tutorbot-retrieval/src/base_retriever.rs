use async_trait::async_trait;
use tutorbot_core::SearchResult;

use crate::error::RetrievalError;

/// Base trait for document retrievers.
///
/// Retrievers take a query string and return relevant documents from a backing store.
#[async_trait]
pub trait BaseRetriever: Send + Sync {
    /// Retrieve up to `top_k` documents relevant to `query`, most relevant first.
    async fn retrieve(&self, query: &str, top_k: usize)
        -> Result<Vec<SearchResult>, RetrievalError>;
}
