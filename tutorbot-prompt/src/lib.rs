mod chat;
mod template;

pub use chat::{ChatPromptTemplate, MessagePromptTemplate};
pub use template::PromptTemplate;
