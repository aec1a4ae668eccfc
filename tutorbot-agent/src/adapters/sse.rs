//! Server-Sent Events framing for [`ChatEvent`]s.

use serde_json::json;

use crate::{AgentError, ChatEvent};

fn format_sse(event_type: &str, payload: serde_json::Value) -> String {
    format!("event: {event_type}\ndata: {payload}\n\n")
}

pub fn to_sse_event(event: &ChatEvent) -> String {
    match event {
        ChatEvent::Status { node, step } => {
            format_sse("status", json!({ "node": node, "step": step }))
        }
        ChatEvent::State(state) => format_sse(
            "state",
            json!({
                "next_step": state.next_step,
                "retry_count": state.retry_count,
                "tool_calls": state.tool_calls,
            }),
        ),
        ChatEvent::Chunk(content) => format_sse("chunk", json!({ "content": content })),
        ChatEvent::Done => done_event(),
    }
}

pub fn error_event(error: &AgentError) -> String {
    format_sse("error", json!({ "message": error.to_string() }))
}

pub fn done_event() -> String {
    format_sse("done", json!({}))
}
