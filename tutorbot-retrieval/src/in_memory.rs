use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tutorbot_core::{Document, SearchResult, StoreError, VectorStore};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Default)]
struct StoreInner {
    docs: Vec<Option<Document>>,
    embeddings: Vec<Option<Vec<f32>>>,
    id_map: HashMap<String, usize>,
    dimension: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    dimension: Option<usize>,
    documents: Vec<Document>,
}

/// Cosine-similarity store kept in memory, with optional JSON snapshots on disk.
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dimension(&self) -> Option<usize> {
        self.inner.read().await.dimension
    }

    pub async fn clear(&self) {
        *self.inner.write().await = StoreInner::default();
    }

    /// Moves every document out of `other` into this store, dropping
    /// whatever this store held before. `other` is left empty.
    pub async fn replace_with(&self, other: &InMemoryVectorStore) {
        let taken = std::mem::take(&mut *other.inner.write().await);
        *self.inner.write().await = taken;
    }

    /// Writes every live document, embeddings included, to `path`.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = {
            let inner = self.inner.read().await;
            let documents = inner
                .docs
                .iter()
                .zip(inner.embeddings.iter())
                .filter_map(|(doc, embedding)| {
                    let mut doc = doc.clone()?;
                    doc.embedding = embedding.clone();
                    Some(doc)
                })
                .collect();
            Snapshot {
                version: SNAPSHOT_VERSION,
                dimension: inner.dimension,
                documents,
            }
        };

        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        }
        // Write a sibling temp file, then rename it over the target.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        Ok(())
    }

    /// Replaces the store contents with the snapshot at `path`.
    pub async fn load_snapshot(&self, path: &Path) -> Result<usize, StoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        self.clear().await;
        let count = snapshot.documents.len();
        self.add(snapshot.documents).await?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, docs: Vec<Document>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for mut doc in docs {
            if doc.id.trim().is_empty() {
                return Err(StoreError::InvalidId(doc.id));
            }

            let embedding = doc
                .embedding
                .take()
                .ok_or_else(|| StoreError::MissingEmbedding(doc.id.clone()))?;
            let dimension = embedding.len();
            match inner.dimension {
                Some(expected) if expected != dimension => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        got: dimension,
                    });
                }
                None => inner.dimension = Some(dimension),
                _ => {}
            }

            if let Some(&index) = inner.id_map.get(&doc.id) {
                inner.docs[index] = Some(doc);
                inner.embeddings[index] = Some(embedding);
            } else {
                let index = inner.docs.len();
                inner.id_map.insert(doc.id.clone(), index);
                inner.docs.push(Some(doc));
                inner.embeddings.push(Some(embedding));
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let inner = self.inner.read().await;
        let expected = inner.dimension.unwrap_or(query_embedding.len());
        if expected != query_embedding.len() {
            return Err(StoreError::DimensionMismatch {
                expected,
                got: query_embedding.len(),
            });
        }

        let mut scored: Vec<SearchResult> = inner
            .embeddings
            .iter()
            .zip(inner.docs.iter())
            .filter_map(|(embedding, doc)| {
                let (embedding, doc) = (embedding.as_ref()?, doc.as_ref()?);
                let mut score = cosine_similarity(query_embedding, embedding);
                if score.is_nan() {
                    score = f32::NEG_INFINITY;
                }
                Some(SearchResult {
                    document: doc.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for id in ids {
            if let Some(idx) = inner.id_map.remove(id) {
                inner.docs[idx] = None;
                inner.embeddings[idx] = None;
            }
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.id_map.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
