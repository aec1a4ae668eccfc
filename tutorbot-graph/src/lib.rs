mod config;
mod error;
mod graph;
mod observer;
mod state;

pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use graph::{ExecutableGraph, GraphBuilder, RouteMap, END};
pub use observer::{Observer, TracingObserver};
pub use state::{GraphState, StateSchema, StateUpdate};
