use async_trait::async_trait;

use crate::{Document, StoreError};

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn add(&self, docs: Vec<Document>) -> Result<(), StoreError>;
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;
    async fn delete(&self, ids: &[String]) -> Result<(), StoreError>;
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for std::sync::Arc<T> {
    async fn add(&self, docs: Vec<Document>) -> Result<(), StoreError> {
        (**self).add(docs).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        (**self).search(query_embedding, top_k).await
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        (**self).delete(ids).await
    }

    async fn len(&self) -> usize {
        (**self).len().await
    }
}
