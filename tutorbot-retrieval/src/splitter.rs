use std::collections::VecDeque;

use thiserror::Error;
use tutorbot_core::{Document, Value};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitterConfigError {
    #[error("chunk_size must be greater than zero")]
    ChunkSizeMustBeGreaterThanZero,
}

/// Splits text on the first separator that occurs (paragraph, line, word,
/// character), recursing into pieces that are still too long, then merges the
/// pieces back into chunks of at most `chunk_size` characters.
///
/// Separators stay attached to the end of the piece they terminate, so with a
/// zero overlap the chunks concatenate back to the input.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitterBuilder {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveCharacterTextSplitterBuilder {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: ["\n\n", "\n", " ", ""].map(String::from).to_vec(),
        }
    }
}

impl RecursiveCharacterTextSplitterBuilder {
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<RecursiveCharacterTextSplitter, SplitterConfigError> {
        if self.chunk_size == 0 {
            return Err(SplitterConfigError::ChunkSizeMustBeGreaterThanZero);
        }
        let mut separators = self.separators;
        if separators.last().map(String::as_str) != Some("") {
            separators.push(String::new());
        }
        Ok(RecursiveCharacterTextSplitter {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap.min(self.chunk_size - 1),
            separators,
        })
    }
}

impl Default for RecursiveCharacterTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: RecursiveCharacterTextSplitterBuilder::default().separators,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl RecursiveCharacterTextSplitter {
    pub fn builder() -> RecursiveCharacterTextSplitterBuilder {
        RecursiveCharacterTextSplitterBuilder::default()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_into_pieces(text, &self.separators, &mut pieces);
        self.merge_pieces(pieces)
    }

    /// Chunks every document, copying its metadata and adding `chunk_index`.
    /// Chunk ids are `<document id>:<chunk index>`.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(move |(index, content)| {
                        let mut metadata = doc.metadata.clone();
                        metadata.insert("chunk_index".to_string(), Value::from(index));
                        Document {
                            id: format!("{}:{}", doc.id, index),
                            content,
                            metadata,
                            embedding: None,
                        }
                    })
            })
            .collect()
    }

    fn split_into_pieces<'a>(&self, text: &'a str, separators: &[String], out: &mut Vec<&'a str>) {
        if text.is_empty() {
            return;
        }
        let Some(position) = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep.as_str()))
        else {
            out.push(text);
            return;
        };

        let separator = separators[position].as_str();
        if separator.is_empty() {
            let mut start = 0;
            for (offset, ch) in text.char_indices() {
                let end = offset + ch.len_utf8();
                out.push(&text[start..end]);
                start = end;
            }
            return;
        }

        let remaining = &separators[position + 1..];
        for piece in text.split_inclusive(separator) {
            if char_len(piece) > self.chunk_size {
                self.split_into_pieces(piece, remaining, out);
            } else {
                out.push(piece);
            }
        }
    }

    fn merge_pieces(&self, pieces: Vec<&str>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            if window_len + piece_len > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().map(|(text, _)| *text).collect::<String>());
                while !window.is_empty()
                    && (window_len > self.chunk_overlap
                        || window_len + piece_len > self.chunk_size)
                {
                    if let Some((_, len)) = window.pop_front() {
                        window_len -= len;
                    }
                }
            }
            window.push_back((piece, piece_len));
            window_len += piece_len;
        }

        if !window.is_empty() {
            chunks.push(window.iter().map(|(text, _)| *text).collect::<String>());
        }
        chunks
    }
}
