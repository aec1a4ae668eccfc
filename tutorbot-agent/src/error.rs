use thiserror::Error;
use tutorbot_core::TutorError;
use tutorbot_graph::GraphError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("input must not be empty")]
    EmptyInput,
    #[error("no language model configured")]
    MissingLlm,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl AgentError {
    /// Underlying workflow error, when a node failed.
    pub fn node_error(&self) -> Option<&TutorError> {
        match self {
            AgentError::Graph(GraphError::NodeFailed { source, .. }) => Some(source),
            _ => None,
        }
    }
}
