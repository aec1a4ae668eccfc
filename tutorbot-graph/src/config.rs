use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionConfig {
    pub max_steps: Option<usize>,
    /// Wall-clock budget for the whole run.
    pub max_duration: Option<Duration>,
    /// Budget for any single node.
    pub node_timeout: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(50),
            max_duration: None,
            node_timeout: None,
        }
    }
}

impl ExecutionConfig {
    pub fn merge(&self, overrides: &ExecutionOptions) -> Self {
        Self {
            max_steps: overrides.max_steps.or(self.max_steps),
            max_duration: overrides.max_duration.or(self.max_duration),
            node_timeout: overrides.node_timeout.or(self.node_timeout),
        }
    }
}

/// Per-invocation overrides; `None` keeps the graph's configured value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionOptions {
    pub max_steps: Option<usize>,
    pub max_duration: Option<Duration>,
    pub node_timeout: Option<Duration>,
}
