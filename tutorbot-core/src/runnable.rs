use async_trait::async_trait;

use crate::TutorError;

/// One async step: a prompt, an LLM call, a graph node.
#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, TutorError>;
}
