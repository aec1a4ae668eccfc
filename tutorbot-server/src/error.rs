use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tutorbot_agent::AgentError;
use tutorbot_graph::GraphError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("query parameter 'input' must not be empty")]
    EmptyInput,
    #[error(transparent)]
    Workflow(AgentError),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EmptyInput => ApiError::EmptyInput,
            other => ApiError::Workflow(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyInput => StatusCode::BAD_REQUEST,
            ApiError::Workflow(err) if is_timeout(err) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Workflow(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "chat request failed");
        } else {
            tracing::debug!(error = %self, %status, "chat request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn is_timeout(err: &AgentError) -> bool {
    matches!(err, AgentError::Graph(GraphError::Timeout { .. }))
}
