mod final_answer;
mod interpreter;
mod retriever;
mod router;

pub use final_answer::FinalAnswerNode;
pub use interpreter::{split_code_reply, CodeInterpreterNode};
pub use retriever::{RetrieverNode, DEFAULT_TOP_K};
pub use router::{normalize_label, RouterNode, DEFAULT_MAX_RETRIES};
