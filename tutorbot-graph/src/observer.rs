use async_trait::async_trait;
use serde_json::Value;

use crate::GraphError;

/// Hooks called around every node execution. States are passed as JSON so
/// observers need not know the state type.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn on_node_enter(&self, _node: &str, _input: &Value) {}
    async fn on_node_exit(&self, _node: &str, _output: &Value, _duration_ms: u128) {}
    async fn on_error(&self, _node: &str, _error: &GraphError) {}
}

/// Logs node lifecycle events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[async_trait]
impl Observer for TracingObserver {
    async fn on_node_enter(&self, node: &str, _input: &Value) {
        tracing::debug!(node, "entering node");
    }

    async fn on_node_exit(&self, node: &str, _output: &Value, duration_ms: u128) {
        tracing::info!(node, duration_ms, "node finished");
    }

    async fn on_error(&self, node: &str, error: &GraphError) {
        tracing::error!(node, error = %error, "node failed");
    }
}
