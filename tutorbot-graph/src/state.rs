use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub trait StateSchema:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static
{
}

/// State threaded through a graph run, plus the names of the nodes that ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct GraphState<S: StateSchema> {
    pub data: S,
    #[serde(default)]
    pub visited: Vec<String>,
}

impl<S: StateSchema> GraphState<S> {
    pub fn new(data: S) -> Self {
        Self {
            data,
            visited: Vec::new(),
        }
    }

    /// Node updates replace the state wholesale.
    pub fn apply(mut self, update: StateUpdate<S>) -> Self {
        self.data = update.data;
        self
    }

    pub fn into_data(self) -> S {
        self.data
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct StateUpdate<S: StateSchema> {
    pub data: S,
}

impl<S: StateSchema> StateUpdate<S> {
    pub fn new(data: S) -> Self {
        Self { data }
    }
}
