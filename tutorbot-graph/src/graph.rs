use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tutorbot_core::Runnable;

use crate::{
    ExecutionConfig, ExecutionOptions, GraphError, GraphState, Observer, StateSchema, StateUpdate,
};

/// Pseudo-node that terminates a run when used as an edge target.
pub const END: &str = "__end__";

type BoxedNode<S> = Box<dyn Runnable<GraphState<S>, StateUpdate<S>> + Send + Sync>;
type RouterFn<S> = Arc<dyn Fn(&GraphState<S>) -> String + Send + Sync>;

/// Maps the keys returned by a conditional edge's router to node names.
///
/// An empty map passes keys through unchanged, so the router may return node
/// names directly. Keys missing from a non-empty map go to the default target
/// when one is set.
#[derive(Clone, Debug, Default)]
pub struct RouteMap {
    routes: HashMap<String, String>,
    default: Option<String>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: impl Into<String>, target: impl Into<String>) -> Self {
        self.routes.insert(key.into(), target.into());
        self
    }

    pub fn default_to(mut self, target: impl Into<String>) -> Self {
        self.default = Some(target.into());
        self
    }

    pub fn resolve(&self, key: &str) -> Option<String> {
        if self.routes.is_empty() && self.default.is_none() {
            return Some(key.to_string());
        }
        self.routes.get(key).or(self.default.as_ref()).cloned()
    }

    fn targets(&self) -> impl Iterator<Item = &String> {
        self.routes.values().chain(self.default.iter())
    }
}

struct ConditionalEdge<S: StateSchema> {
    router: RouterFn<S>,
    routes: RouteMap,
}

pub struct GraphBuilder<S: StateSchema> {
    nodes: HashMap<String, BoxedNode<S>>,
    edges: HashMap<String, String>,
    conditional_edges: HashMap<String, ConditionalEdge<S>>,
    entry: Option<String>,
    config: ExecutionConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            conditional_edges: HashMap::new(),
            entry: None,
            config: ExecutionConfig::default(),
            observer: None,
        }
    }

    pub fn add_node<R>(mut self, name: &str, node: R) -> Self
    where
        R: Runnable<GraphState<S>, StateUpdate<S>> + Send + Sync + 'static,
    {
        self.nodes.insert(name.to_string(), Box::new(node));
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges.insert(from.to_string(), to.to_string());
        self
    }

    /// After `from` runs, `router` picks a key that `routes` maps to the next
    /// node. Takes precedence over a static edge from the same node.
    pub fn add_conditional_edge<F>(mut self, from: &str, router: F, routes: RouteMap) -> Self
    where
        F: Fn(&GraphState<S>) -> String + Send + Sync + 'static,
    {
        self.conditional_edges.insert(
            from.to_string(),
            ConditionalEdge {
                router: Arc::new(router),
                routes,
            },
        );
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn check_target(&self, from: &str, to: &str) -> Result<(), GraphError> {
        if to == END || self.nodes.contains_key(to) {
            Ok(())
        } else {
            Err(GraphError::InvalidEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    fn check_source(&self, from: &str) -> Result<(), GraphError> {
        if self.nodes.contains_key(from) {
            Ok(())
        } else {
            Err(GraphError::MissingNode {
                node: from.to_string(),
            })
        }
    }

    /// Validates the wiring: the entry exists and every edge and route target
    /// is a node or [`END`].
    pub fn build(self) -> Result<ExecutableGraph<S>, GraphError> {
        let entry = self.entry.clone().ok_or(GraphError::MissingEntry)?;
        self.check_source(&entry)?;
        for (from, to) in &self.edges {
            self.check_source(from)?;
            self.check_target(from, to)?;
        }
        for (from, edge) in &self.conditional_edges {
            self.check_source(from)?;
            for target in edge.routes.targets() {
                self.check_target(from, target)?;
            }
        }

        Ok(ExecutableGraph {
            nodes: self.nodes,
            edges: self.edges,
            conditional_edges: self.conditional_edges,
            entry,
            config: self.config,
            observer: self.observer,
        })
    }
}

pub struct ExecutableGraph<S: StateSchema> {
    nodes: HashMap<String, BoxedNode<S>>,
    edges: HashMap<String, String>,
    conditional_edges: HashMap<String, ConditionalEdge<S>>,
    entry: String,
    config: ExecutionConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl<S: StateSchema> ExecutableGraph<S> {
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub async fn invoke(&self, state: GraphState<S>) -> Result<GraphState<S>, GraphError> {
        self.invoke_with_options(state, ExecutionOptions::default())
            .await
    }

    pub async fn invoke_with_options(
        &self,
        state: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<GraphState<S>, GraphError> {
        let config = self.config.merge(&options);
        let started = Instant::now();
        let run = self.run(state, &config);
        match config.max_duration {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| GraphError::Timeout {
                    node: None,
                    elapsed: started.elapsed(),
                })?,
            None => run.await,
        }
    }

    async fn run(
        &self,
        mut state: GraphState<S>,
        config: &ExecutionConfig,
    ) -> Result<GraphState<S>, GraphError> {
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        while current != END {
            if let Some(max) = config.max_steps {
                if steps >= max {
                    return Err(GraphError::MaxStepsExceeded {
                        max,
                        reached: steps,
                    });
                }
            }
            steps += 1;

            state = self.run_node(&current, state, config).await?;
            state.visited.push(current.clone());

            current = match self.next_node(&current, &state)? {
                Some(next) => next,
                None => break,
            };
        }
        tracing::debug!(steps, path = ?state.visited, "graph run complete");
        Ok(state)
    }

    async fn run_node(
        &self,
        name: &str,
        state: GraphState<S>,
        config: &ExecutionConfig,
    ) -> Result<GraphState<S>, GraphError> {
        let node = self.nodes.get(name).ok_or_else(|| GraphError::MissingNode {
            node: name.to_string(),
        })?;

        if let Some(observer) = &self.observer {
            observer.on_node_enter(name, &to_json(&state.data)).await;
        }

        let started = Instant::now();
        let pending = node.invoke(state.clone());
        let result = match config.node_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => result.map_err(|source| GraphError::NodeFailed {
                    node: name.to_string(),
                    source,
                }),
                Err(_) => Err(GraphError::Timeout {
                    node: Some(name.to_string()),
                    elapsed: started.elapsed(),
                }),
            },
            None => pending.await.map_err(|source| GraphError::NodeFailed {
                node: name.to_string(),
                source,
            }),
        };

        match result {
            Ok(update) => {
                let next = state.apply(update);
                if let Some(observer) = &self.observer {
                    observer
                        .on_node_exit(name, &to_json(&next.data), started.elapsed().as_millis())
                        .await;
                }
                Ok(next)
            }
            Err(err) => {
                if let Some(observer) = &self.observer {
                    observer.on_error(name, &err).await;
                }
                Err(err)
            }
        }
    }

    fn next_node(&self, current: &str, state: &GraphState<S>) -> Result<Option<String>, GraphError> {
        if let Some(edge) = self.conditional_edges.get(current) {
            let key = (edge.router)(state);
            return edge
                .routes
                .resolve(&key)
                .map(Some)
                .ok_or_else(|| GraphError::UnknownRoute {
                    node: current.to_string(),
                    route: key,
                });
        }
        Ok(self.edges.get(current).cloned())
    }
}

fn to_json<S: StateSchema>(data: &S) -> Value {
    serde_json::to_value(data).unwrap_or(Value::Null)
}
