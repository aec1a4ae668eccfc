use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tutorbot_core::{Runnable, TutorError, Value};
use tutorbot_graph::{GraphState, StateUpdate};
use tutorbot_retrieval::BaseRetriever;

use crate::{ChatState, ToolKind};

pub const DEFAULT_TOP_K: usize = 4;

pub struct RetrieverNode {
    retriever: Arc<dyn BaseRetriever>,
    top_k: usize,
}

impl RetrieverNode {
    pub fn new(retriever: Arc<dyn BaseRetriever>) -> Self {
        Self {
            retriever,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }
}

#[async_trait]
impl Runnable<GraphState<ChatState>, StateUpdate<ChatState>> for RetrieverNode {
    async fn invoke(
        &self,
        input: GraphState<ChatState>,
    ) -> Result<StateUpdate<ChatState>, TutorError> {
        let mut state = input.data;
        state.record_call(ToolKind::RagRetriever, state.input.clone());

        let results = self
            .retriever
            .retrieve(&state.input, self.top_k)
            .await
            .map_err(|err| TutorError::Retrieval(err.to_string()))?;
        tracing::info!(hits = results.len(), top_k = self.top_k, "retrieved documentation");

        let snippets: Vec<Value> = results
            .into_iter()
            .map(|hit| {
                let source = hit.document.source().map(str::to_string);
                json!({
                    "content": hit.document.content,
                    "source": source,
                    "score": hit.score,
                })
            })
            .collect();
        state.record_result(ToolKind::RagRetriever, Value::Array(snippets));
        Ok(StateUpdate::new(state))
    }
}
