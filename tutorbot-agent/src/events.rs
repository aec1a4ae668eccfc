use crate::ChatState;

/// Characters per `Chunk` event when replaying an answer.
pub const ANSWER_CHUNK_CHARS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// A workflow node finished; `step` counts from 1.
    Status { node: String, step: usize },
    /// Final workflow state, sent once before the answer chunks.
    State(Box<ChatState>),
    Chunk(String),
    Done,
}

/// Splits `answer` into pieces of at most `size` characters.
pub fn chunk_answer(answer: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = answer.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
