use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tutorbot_agent::adapters::sse::{error_event, to_sse_event};
use tutorbot_agent::ChatState;

use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub input: Option<String>,
}

impl ChatQuery {
    fn input(&self) -> Result<&str, ApiError> {
        match self.input.as_deref().map(str::trim) {
            Some(input) if !input.is_empty() => Ok(input),
            _ => Err(ApiError::EmptyInput),
        }
    }
}

pub async fn chat(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<ChatState>, ApiError> {
    let input = query.input()?;
    tracing::info!(input_chars = input.chars().count(), "chat request");
    let result = state.agent.run(input).await?;
    tracing::info!(
        next_step = ?result.next_step,
        retry_count = result.retry_count,
        "chat request complete"
    );
    Ok(Json(result))
}

pub async fn chat_stream(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> Result<Response, ApiError> {
    let input = query.input()?;
    let events = state.agent.query_stream(input).await?;
    let frames = events.map(|item| {
        let frame = match item {
            Ok(event) => to_sse_event(&event),
            Err(err) => {
                tracing::error!(error = %err, "chat stream failed");
                error_event(&err)
            }
        };
        Ok::<_, Infallible>(frame)
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
