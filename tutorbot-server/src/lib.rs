//! HTTP service for the tutorbot chat workflow.
//!
//! `GET /chat?input=…` answers with the final [`ChatState`] as JSON,
//! `GET /chat/stream?input=…` with Server-Sent Events.
//!
//! [`ChatState`]: tutorbot_agent::ChatState

mod config;
mod error;
mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use secrecy::ExposeSecret;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tutorbot_agent::{AgentError, ChatAgent};
use tutorbot_core::{Embedding, Tool};
use tutorbot_embeddings::GoogleEmbedding;
use tutorbot_graph::ExecutionConfig;
use tutorbot_llm::GoogleClient;
use tutorbot_retrieval::{DocsRetriever, HashEmbedder};
use tutorbot_tools::PythonInterpreter;

pub use config::{
    ConfigError, EmbeddingProvider, ServerConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use error::ApiError;
pub use routes::ChatQuery;

/// Requests carry their input in the query string.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ChatAgent>,
}

impl AppState {
    pub fn new(agent: ChatAgent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }
}

pub fn app(state: AppState, max_concurrency: usize) -> Router {
    Router::new()
        .route("/chat", get(routes::chat))
        .route("/chat/stream", get(routes::chat_stream))
        .route("/health", get(routes::health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(ConcurrencyLimitLayer::new(max_concurrency.max(1)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graph limits for one request; a run past `request_timeout` answers 504.
pub fn execution_config(config: &ServerConfig) -> ExecutionConfig {
    ExecutionConfig {
        max_duration: Some(config.request_timeout),
        ..ExecutionConfig::default()
    }
}

/// Wires the Gemini model, the documentation retriever and the Python
/// interpreter into a [`ChatAgent`].
pub fn build_agent(config: &ServerConfig) -> Result<ChatAgent, AgentError> {
    let api_key = config.api_key.expose_secret();
    let llm = GoogleClient::new(api_key.as_str(), config.model.as_str());

    let embedder: Arc<dyn Embedding> = match config.embedding_provider {
        EmbeddingProvider::Google => Arc::new(
            GoogleEmbedding::new(
                api_key.as_str(),
                config.embedding_model.as_str(),
                config.embedding_dimension,
            )
            .for_retrieval(),
        ),
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.embedding_dimension)),
    };
    let retriever = DocsRetriever::new(embedder, config.corpus_dir.clone())
        .with_snapshot_path(config.index_path.clone())
        .with_top_k(config.top_k);

    let interpreter: Arc<dyn Tool> = Arc::new(
        PythonInterpreter::new()
            .with_program(config.python.clone())
            .with_timeout(config.python_timeout),
    );

    tracing::info!(
        model = %config.model,
        embedding_provider = ?config.embedding_provider,
        corpus_dir = %config.corpus_dir.display(),
        index_path = %config.index_path.display(),
        request_timeout = ?config.request_timeout,
        "building chat agent"
    );

    ChatAgent::builder()
        .with_llm(Arc::new(llm))
        .with_retriever(Arc::new(retriever))
        .with_interpreter(interpreter)
        .with_max_retries(config.router_max_retries)
        .with_top_k(config.top_k)
        .with_execution_config(execution_config(config))
        .build()
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
