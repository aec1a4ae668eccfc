mod common;

use std::sync::Arc;

use common::ScriptedLlm;
use futures::StreamExt;
use tutorbot_agent::{AgentError, ChatAgent, ChatEvent, Route};
use tutorbot_core::TutorError;

#[tokio::test]
async fn query_stream_emits_status_state_chunks_then_done() {
    let llm = ScriptedLlm::new(["final_answer", "Gradient descent minimizes loss."]);
    let agent = ChatAgent::builder()
        .with_llm(Arc::new(llm))
        .build()
        .unwrap();

    let events: Vec<ChatEvent> = agent
        .query_stream("what is gradient descent?")
        .await
        .unwrap()
        .map(|item| item.expect("stream should not emit errors"))
        .collect()
        .await;

    assert_eq!(
        events[0],
        ChatEvent::Status {
            node: "router".to_string(),
            step: 1
        }
    );
    assert_eq!(
        events[1],
        ChatEvent::Status {
            node: "final_answer".to_string(),
            step: 2
        }
    );
    match &events[2] {
        ChatEvent::State(state) => {
            assert_eq!(state.next_step, Some(Route::FinalAnswer));
            assert_eq!(state.output.as_deref(), Some("Gradient descent minimizes loss."));
        }
        other => panic!("expected state event, got {other:?}"),
    }

    let chunks: Vec<&str> = events[3..events.len() - 1]
        .iter()
        .map(|event| match event {
            ChatEvent::Chunk(chunk) => chunk.as_str(),
            other => panic!("expected chunk, got {other:?}"),
        })
        .collect();
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 5));
    assert_eq!(chunks.concat(), "Gradient descent minimizes loss.");
    assert_eq!(events.last(), Some(&ChatEvent::Done));
}

#[tokio::test]
async fn query_stream_surfaces_workflow_errors() {
    let llm = ScriptedLlm::default();
    llm.push_error(TutorError::LlmProvider("quota exceeded".to_string()));
    let agent = ChatAgent::builder()
        .with_llm(Arc::new(llm))
        .build()
        .unwrap();

    let items: Vec<Result<ChatEvent, AgentError>> =
        agent.query_stream("hello").await.unwrap().collect().await;

    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn query_stream_rejects_blank_input_up_front() {
    let agent = ChatAgent::builder()
        .with_llm(Arc::new(ScriptedLlm::default()))
        .build()
        .unwrap();

    assert!(matches!(
        agent.query_stream("").await.err(),
        Some(AgentError::EmptyInput)
    ));
}

#[test]
fn chunk_answer_splits_on_char_boundaries() {
    let chunks = tutorbot_agent::chunk_answer("héllo wörld", 5);
    assert_eq!(chunks, vec!["héllo", " wörl", "d"]);
    assert!(tutorbot_agent::chunk_answer("", 5).is_empty());
}
