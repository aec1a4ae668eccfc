use tutorbot_core::{Document, Embedding, VectorStore};

use crate::RetrievalError;

const DEFAULT_BATCH_SIZE: usize = 64;

pub struct Indexer<E, S> {
    embedder: E,
    store: S,
    batch_size: usize,
}

impl<E, S> Indexer<E, S>
where
    E: Embedding,
    S: VectorStore,
{
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embeds and stores `docs`, returning how many were indexed.
    /// Batches already stored stay in `store` if a later batch fails.
    pub async fn index(&self, docs: Vec<Document>) -> Result<usize, RetrievalError> {
        if let Some(doc) = docs.iter().find(|doc| doc.id.trim().is_empty()) {
            return Err(RetrievalError::InvalidId(doc.id.clone()));
        }

        let total = docs.len();
        let mut pending = docs.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<Document> = pending.by_ref().take(self.batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|doc| doc.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            let with_embeddings = batch
                .into_iter()
                .zip(embeddings)
                .map(|(mut doc, embedding)| {
                    doc.embedding = Some(embedding);
                    doc
                })
                .collect();
            self.store.add(with_embeddings).await?;
            tracing::debug!(indexed = texts.len(), total, "indexed document batch");
        }
        Ok(total)
    }
}
