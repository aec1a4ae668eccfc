use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tutorbot_core::{Embedding, SearchResult, VectorStore};

use crate::{
    collect_corpus_paths, load_and_split_recursive, BaseRetriever, IngestionError,
    InMemoryVectorStore, Indexer, RecursiveCharacterTextSplitter, RetrievalError,
};

pub const DEFAULT_TOP_K: usize = 4;

/// Retriever over a local documentation corpus.
///
/// The index is built on first use: from the snapshot file when one exists
/// and matches the embedder's dimension, otherwise by loading, splitting and
/// embedding the corpus directory (the fresh index is then saved as the new
/// snapshot). The index is assembled in a staging store and only becomes
/// visible once it is complete, so a failed build leaves nothing behind.
/// Later queries reuse the in-memory store.
pub struct DocsRetriever {
    embedder: Arc<dyn Embedding>,
    store: InMemoryVectorStore,
    corpus_dir: PathBuf,
    snapshot_path: Option<PathBuf>,
    splitter: RecursiveCharacterTextSplitter,
    top_k: usize,
    indexed: OnceCell<usize>,
}

impl DocsRetriever {
    pub fn new(embedder: Arc<dyn Embedding>, corpus_dir: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            store: InMemoryVectorStore::new(),
            corpus_dir: corpus_dir.into(),
            snapshot_path: None,
            splitter: RecursiveCharacterTextSplitter::default(),
            top_k: DEFAULT_TOP_K,
            indexed: OnceCell::new(),
        }
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_splitter(mut self, splitter: RecursiveCharacterTextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn store(&self) -> &InMemoryVectorStore {
        &self.store
    }

    /// Builds the index if this process has not done so yet and returns the
    /// number of indexed chunks. Failures are not cached, so the next call
    /// tries again.
    pub async fn ensure_index(&self) -> Result<usize, RetrievalError> {
        self.indexed
            .get_or_try_init(|| self.build_index())
            .await
            .copied()
    }

    /// Top-`top_k` chunks for `query`, best first.
    pub async fn query(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        self.retrieve(query, self.top_k).await
    }

    async fn build_index(&self) -> Result<usize, RetrievalError> {
        let staging = InMemoryVectorStore::new();
        let count = self.build_into(&staging).await?;
        self.store.replace_with(&staging).await;
        Ok(count)
    }

    async fn build_into(&self, staging: &InMemoryVectorStore) -> Result<usize, RetrievalError> {
        if let Some(path) = self.snapshot_path.as_deref() {
            if let Some(count) = self.try_load_snapshot(staging, path).await {
                return Ok(count);
            }
        }

        let paths = collect_corpus_paths(&self.corpus_dir)?;
        if paths.is_empty() {
            return Err(IngestionError::EmptyCorpus(self.corpus_dir.clone()).into());
        }
        let chunks = load_and_split_recursive(paths, &self.splitter).await?;
        let count = Indexer::new(self.embedder.clone(), staging.clone())
            .index(chunks)
            .await?;
        tracing::info!(
            corpus = %self.corpus_dir.display(),
            chunks = count,
            "indexed documentation corpus"
        );

        if let Some(path) = self.snapshot_path.as_deref() {
            staging.save_snapshot(path).await?;
            tracing::info!(path = %path.display(), "saved index snapshot");
        }
        Ok(count)
    }

    async fn try_load_snapshot(&self, staging: &InMemoryVectorStore, path: &Path) -> Option<usize> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return None;
        }
        match staging.load_snapshot(path).await {
            Ok(0) => None,
            Ok(count) => {
                let dimension = staging.dimension().await;
                if dimension != Some(self.embedder.dimension()) {
                    tracing::warn!(
                        path = %path.display(),
                        snapshot_dimension = ?dimension,
                        embedder_dimension = self.embedder.dimension(),
                        "snapshot dimension does not match embedder, rebuilding index"
                    );
                    staging.clear().await;
                    return None;
                }
                tracing::info!(path = %path.display(), chunks = count, "loaded index snapshot");
                Some(count)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable index snapshot, rebuilding index");
                staging.clear().await;
                None
            }
        }
    }
}

#[async_trait]
impl BaseRetriever for DocsRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        self.ensure_index().await?;
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&embedding, top_k).await?;
        tracing::debug!(hits = results.len(), top_k, "retrieved documentation chunks");
        Ok(results)
    }
}
