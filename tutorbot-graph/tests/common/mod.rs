#![allow(dead_code)]

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tutorbot_core::{Runnable, TutorError};
use tutorbot_graph::{GraphState, StateSchema, StateUpdate};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct DemoState {
    pub count: i32,
    pub log: Vec<String>,
}

impl StateSchema for DemoState {}

/// Adds one to `count` and records its name.
pub struct Inc(pub &'static str);

#[async_trait::async_trait]
impl Runnable<GraphState<DemoState>, StateUpdate<DemoState>> for Inc {
    async fn invoke(
        &self,
        input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, TutorError> {
        let mut data = input.data;
        data.count += 1;
        data.log.push(self.0.to_string());
        Ok(StateUpdate::new(data))
    }
}

pub struct Fail;

#[async_trait::async_trait]
impl Runnable<GraphState<DemoState>, StateUpdate<DemoState>> for Fail {
    async fn invoke(
        &self,
        _input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, TutorError> {
        Err(TutorError::LlmProvider("boom".to_string()))
    }
}

pub struct Sleep(pub Duration);

#[async_trait::async_trait]
impl Runnable<GraphState<DemoState>, StateUpdate<DemoState>> for Sleep {
    async fn invoke(
        &self,
        input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, TutorError> {
        tokio::time::sleep(self.0).await;
        Ok(StateUpdate::new(input.data))
    }
}
