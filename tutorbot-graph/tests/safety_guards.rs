mod common;

use std::time::Duration;

use common::{DemoState, Inc, Sleep};
use tutorbot_graph::{ExecutionConfig, ExecutionOptions, GraphBuilder, GraphError, GraphState, END};

#[tokio::test]
async fn max_steps_stops_cycles() {
    let graph = GraphBuilder::new()
        .add_node("a", Inc("a"))
        .add_node("b", Inc("b"))
        .add_edge("a", "b")
        .add_edge("b", "a")
        .set_entry("a")
        .with_config(ExecutionConfig {
            max_steps: Some(5),
            ..Default::default()
        })
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::MaxStepsExceeded { max: 5, reached: 5 }));
}

#[tokio::test]
async fn test_global_timeout() {
    let graph = GraphBuilder::new()
        .add_node("A", Sleep(Duration::from_millis(50)))
        .add_node("B", Sleep(Duration::from_millis(50)))
        .add_node("C", Sleep(Duration::from_millis(50)))
        .add_edge("A", "B")
        .add_edge("B", "C")
        .add_edge("C", END)
        .set_entry("A")
        .build()
        .unwrap();

    let options = ExecutionOptions {
        max_duration: Some(Duration::from_millis(70)),
        ..Default::default()
    };
    let result = graph
        .invoke_with_options(GraphState::new(DemoState::default()), options)
        .await;

    assert!(matches!(result, Err(GraphError::Timeout { node: None, .. })));
}

#[tokio::test]
async fn test_node_timeout() {
    let graph = GraphBuilder::new()
        .add_node("slow_node", Sleep(Duration::from_millis(200)))
        .add_edge("slow_node", END)
        .set_entry("slow_node")
        .build()
        .unwrap();

    let options = ExecutionOptions {
        node_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let result = graph
        .invoke_with_options(GraphState::new(DemoState::default()), options)
        .await;

    match result {
        Err(GraphError::Timeout { node: Some(node), .. }) => assert_eq!(node, "slow_node"),
        other => panic!("expected node timeout, got {other:?}"),
    }
}
