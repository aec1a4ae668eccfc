use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tutorbot_core::{Tool, Value};
use tutorbot_graph::{
    ExecutableGraph, ExecutionConfig, GraphBuilder, GraphError, GraphState, Observer, RouteMap,
    TracingObserver, END,
};
use tutorbot_llm::Llm;
use tutorbot_retrieval::BaseRetriever;

use crate::events::{chunk_answer, ANSWER_CHUNK_CHARS};
use crate::nodes::{
    CodeInterpreterNode, FinalAnswerNode, RetrieverNode, RouterNode, DEFAULT_MAX_RETRIES,
};
use crate::{AgentError, ChatEvent, ChatState, Route, ToolKind};

const ROUTER: &str = "router";
const DEFAULT_EVENT_BUFFER: usize = 64;

/// The chat workflow: router, then at most one tool, then the final answer.
///
/// Components are shared behind `Arc`s and a fresh graph is wired per
/// request, so one agent serves any number of concurrent requests.
#[derive(Clone)]
pub struct ChatAgent {
    llm: Arc<dyn Llm>,
    retriever: Option<Arc<dyn BaseRetriever>>,
    interpreter: Option<Arc<dyn Tool>>,
    max_retries: u32,
    top_k: usize,
    execution: ExecutionConfig,
    observer: Arc<dyn Observer>,
    event_buffer_size: usize,
}

pub struct ChatAgentBuilder {
    llm: Option<Arc<dyn Llm>>,
    retriever: Option<Arc<dyn BaseRetriever>>,
    interpreter: Option<Arc<dyn Tool>>,
    max_retries: u32,
    top_k: usize,
    execution: ExecutionConfig,
    observer: Arc<dyn Observer>,
    event_buffer_size: usize,
}

impl ChatAgent {
    pub fn builder() -> ChatAgentBuilder {
        ChatAgentBuilder {
            llm: None,
            retriever: None,
            interpreter: None,
            max_retries: DEFAULT_MAX_RETRIES,
            top_k: crate::nodes::DEFAULT_TOP_K,
            execution: ExecutionConfig::default(),
            observer: Arc::new(TracingObserver),
            event_buffer_size: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn available_tools(&self) -> Vec<ToolKind> {
        let mut tools = Vec::new();
        if self.retriever.is_some() {
            tools.push(ToolKind::RagRetriever);
        }
        if self.interpreter.is_some() {
            tools.push(ToolKind::CodeInterpreter);
        }
        tools
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }

    fn graph(&self, observer: Arc<dyn Observer>) -> Result<ExecutableGraph<ChatState>, GraphError> {
        let tools = self.available_tools();
        let router =
            RouterNode::new(self.llm.clone(), tools.clone()).with_max_retries(self.max_retries);

        let mut routes = RouteMap::new()
            .route(Route::FinalAnswer.as_str(), Route::FinalAnswer.as_str())
            .default_to(Route::FinalAnswer.as_str());
        let mut builder = GraphBuilder::new()
            .add_node(ROUTER, router)
            .add_node(
                Route::FinalAnswer.as_str(),
                FinalAnswerNode::new(self.llm.clone()),
            )
            .add_edge(Route::FinalAnswer.as_str(), END);

        if let Some(retriever) = &self.retriever {
            builder = builder
                .add_node(
                    ToolKind::RagRetriever.as_str(),
                    RetrieverNode::new(retriever.clone()).with_top_k(self.top_k),
                )
                .add_edge(ToolKind::RagRetriever.as_str(), Route::FinalAnswer.as_str());
        }
        if let Some(interpreter) = &self.interpreter {
            builder = builder
                .add_node(
                    ToolKind::CodeInterpreter.as_str(),
                    CodeInterpreterNode::new(self.llm.clone(), interpreter.clone()),
                )
                .add_edge(ToolKind::CodeInterpreter.as_str(), Route::FinalAnswer.as_str());
        }
        for tool in tools {
            routes = routes.route(tool.as_str(), tool.as_str());
        }

        builder
            .add_conditional_edge(
                ROUTER,
                |state: &GraphState<ChatState>| {
                    state
                        .data
                        .next_step
                        .unwrap_or(Route::FinalAnswer)
                        .as_str()
                        .to_string()
                },
                routes,
            )
            .set_entry(ROUTER)
            .with_config(self.execution.clone())
            .with_observer(observer)
            .build()
    }

    /// Runs the workflow for one input and returns the final state.
    pub async fn run(&self, input: &str) -> Result<ChatState, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::EmptyInput);
        }
        let graph = self.graph(self.observer.clone())?;
        let state = graph.invoke(GraphState::new(ChatState::new(input))).await?;
        Ok(state.into_data())
    }

    /// Runs the workflow in the background, yielding a `Status` per finished
    /// node, then the final `State`, the answer in small `Chunk`s, and `Done`.
    /// A failure ends the stream with an `Err` item.
    pub async fn query_stream(
        &self,
        input: &str,
    ) -> Result<ReceiverStream<Result<ChatEvent, AgentError>>, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let (tx, rx) = mpsc::channel(self.event_buffer_size);
        let observer = Arc::new(ChannelObserver {
            inner: self.observer.clone(),
            events: tx.clone(),
            step: AtomicUsize::new(0),
        });
        let graph = self.graph(observer)?;
        let state = GraphState::new(ChatState::new(input));

        tokio::spawn(async move {
            match graph.invoke(state).await {
                Ok(state) => {
                    let state = state.into_data();
                    let answer = state.output.clone().unwrap_or_default();
                    if tx.send(Ok(ChatEvent::State(Box::new(state)))).await.is_err() {
                        return;
                    }
                    for chunk in chunk_answer(&answer, ANSWER_CHUNK_CHARS) {
                        if tx.send(Ok(ChatEvent::Chunk(chunk))).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Ok(ChatEvent::Done)).await;
                }
                Err(err) => {
                    let _ = tx.send(Err(AgentError::Graph(err))).await;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

impl ChatAgentBuilder {
    pub fn with_llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn BaseRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn Tool>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_execution_config(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_event_buffer_size(mut self, event_buffer_size: usize) -> Self {
        if event_buffer_size > 0 {
            self.event_buffer_size = event_buffer_size;
        }
        self
    }

    pub fn build(self) -> Result<ChatAgent, AgentError> {
        let agent = ChatAgent {
            llm: self.llm.ok_or(AgentError::MissingLlm)?,
            retriever: self.retriever,
            interpreter: self.interpreter,
            max_retries: self.max_retries,
            top_k: self.top_k,
            execution: self.execution,
            observer: self.observer,
            event_buffer_size: self.event_buffer_size,
        };
        // Wire once up front so misconfiguration surfaces at startup.
        agent.graph(agent.observer.clone())?;
        Ok(agent)
    }
}

/// Forwards node completions to a stream consumer, then to the wrapped observer.
struct ChannelObserver {
    inner: Arc<dyn Observer>,
    events: mpsc::Sender<Result<ChatEvent, AgentError>>,
    step: AtomicUsize,
}

#[async_trait]
impl Observer for ChannelObserver {
    async fn on_node_enter(&self, node: &str, input: &Value) {
        self.inner.on_node_enter(node, input).await;
    }

    async fn on_node_exit(&self, node: &str, output: &Value, duration_ms: u128) {
        self.inner.on_node_exit(node, output, duration_ms).await;
        let step = self.step.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self
            .events
            .send(Ok(ChatEvent::Status {
                node: node.to_string(),
                step,
            }))
            .await;
    }

    async fn on_error(&self, node: &str, error: &GraphError) {
        self.inner.on_error(node, error).await;
    }
}
