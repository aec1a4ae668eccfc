use tutorbot_agent::adapters::sse::{done_event, error_event, to_sse_event};
use tutorbot_agent::{AgentError, ChatEvent, ChatState, Route};

#[test]
fn chunk_event_is_framed_as_sse() {
    let frame = to_sse_event(&ChatEvent::Chunk("Hello".to_string()));
    assert_eq!(frame, "event: chunk\ndata: {\"content\":\"Hello\"}\n\n");
}

#[test]
fn state_event_carries_the_routing_decision() {
    let mut state = ChatState::new("q");
    state.next_step = Some(Route::RagRetriever);
    state.retry_count = 2;

    let frame = to_sse_event(&ChatEvent::State(Box::new(state)));

    assert!(frame.starts_with("event: state\ndata: "));
    assert!(frame.contains("\"next_step\":\"rag_retriever\""));
    assert!(frame.contains("\"retry_count\":2"));
    assert!(frame.ends_with("\n\n"));
}

#[test]
fn status_done_and_error_events() {
    assert_eq!(
        to_sse_event(&ChatEvent::Status {
            node: "router".to_string(),
            step: 1
        }),
        "event: status\ndata: {\"node\":\"router\",\"step\":1}\n\n"
    );
    assert_eq!(to_sse_event(&ChatEvent::Done), done_event());
    assert_eq!(done_event(), "event: done\ndata: {}\n\n");
    assert_eq!(
        error_event(&AgentError::EmptyInput),
        "event: error\ndata: {\"message\":\"input must not be empty\"}\n\n"
    );
}
