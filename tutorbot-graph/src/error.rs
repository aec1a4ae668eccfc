use std::time::Duration;

use thiserror::Error;
use tutorbot_core::TutorError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: TutorError,
    },
    #[error("graph has no entry node")]
    MissingEntry,
    #[error("missing node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge '{from}' -> '{to}'")]
    InvalidEdge { from: String, to: String },
    #[error("node '{node}' routed to unknown key '{route}'")]
    UnknownRoute { node: String, route: String },
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
    /// `node` is `None` when the whole-run budget ran out.
    #[error("timed out after {elapsed:?} (node: {})", .node.as_deref().unwrap_or("<graph>"))]
    Timeout {
        node: Option<String>,
        elapsed: Duration,
    },
}

impl From<GraphError> for TutorError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeFailed { source, .. } => source,
            GraphError::Timeout { elapsed, .. } => TutorError::Timeout(elapsed),
            other => TutorError::Custom(other.to_string()),
        }
    }
}
