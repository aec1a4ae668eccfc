use crate::EmbeddingProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tutorbot_core::{Embedding, EmbeddingError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// `batchEmbedContents` rejects more requests than this in one call.
const MAX_BATCH_SIZE: usize = 100;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

#[derive(Clone)]
pub struct GoogleEmbedding {
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    query_task_type: Option<String>,
    document_task_type: Option<String>,
    http: Client,
}

impl GoogleEmbedding {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
            query_task_type: None,
            document_task_type: None,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets `RETRIEVAL_QUERY` for single embeddings and `RETRIEVAL_DOCUMENT` for batches.
    pub fn for_retrieval(mut self) -> Self {
        self.query_task_type = Some("RETRIEVAL_QUERY".to_string());
        self.document_task_type = Some("RETRIEVAL_DOCUMENT".to_string());
        self
    }

    fn model_name(&self) -> &str {
        self.model
            .strip_prefix("models/")
            .unwrap_or(self.model.as_str())
    }

    fn embed_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model_name()
        )
    }

    fn batch_embed_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url.trim_end_matches('/'),
            self.model_name()
        )
    }

    fn check_dimension(&self, values: &[f32]) -> Result<(), EmbeddingError> {
        if values.len() != self.dimension {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected embedding dimension {}, got {}",
                self.dimension,
                values.len()
            ))
            .into());
        }
        Ok(())
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, EmbeddingError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| EmbeddingProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingProviderError::Http {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<R>()
            .await
            .map_err(|err| EmbeddingProviderError::InvalidResponse(err.to_string()).into())
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(alias = "value")]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

#[async_trait]
impl Embedding for GoogleEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedContentRequest {
            model: None,
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type: self.query_task_type.clone(),
        };

        let response: EmbedContentResponse = self.post(self.embed_url(), &request).await?;
        self.check_dimension(&response.embedding.values)?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut output = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let requests = chunk
                .iter()
                .map(|text| EmbedContentRequest {
                    model: Some(format!("models/{}", self.model_name())),
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                    task_type: self.document_task_type.clone(),
                })
                .collect();

            let response: BatchEmbedContentsResponse = self
                .post(self.batch_embed_url(), &BatchEmbedContentsRequest { requests })
                .await?;

            if response.embeddings.len() != chunk.len() {
                return Err(EmbeddingProviderError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    response.embeddings.len()
                ))
                .into());
            }

            for embedding in response.embeddings {
                self.check_dimension(&embedding.values)?;
                output.push(embedding.values);
            }
        }

        Ok(output)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
