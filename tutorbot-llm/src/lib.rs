pub mod providers;

pub use providers::google::{GoogleClient, DEFAULT_GEMINI_MODEL};
pub use tutorbot_core::{LlmRequest, LlmResponse, Message, Role};

use tutorbot_core::Runnable;

pub trait Llm: Runnable<LlmRequest, LlmResponse> + Send + Sync {}

impl<T> Llm for T where T: Runnable<LlmRequest, LlmResponse> + Send + Sync {}
