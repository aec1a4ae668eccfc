mod base_retriever;
mod docs_retriever;
mod error;
mod hash_embedder;
mod in_memory;
mod indexer;
mod loader;
mod splitter;

pub use base_retriever::BaseRetriever;
pub use docs_retriever::DocsRetriever;
pub use error::{IngestionError, RetrievalError};
pub use hash_embedder::HashEmbedder;
pub use in_memory::InMemoryVectorStore;
pub use indexer::Indexer;
pub use loader::{collect_corpus_paths, load_file_async, load_files_async, SUPPORTED_EXTENSIONS};
pub use splitter::{RecursiveCharacterTextSplitter, RecursiveCharacterTextSplitterBuilder, SplitterConfigError};

use std::path::PathBuf;

use tutorbot_core::Document;

pub async fn load_and_split_recursive(
    paths: Vec<PathBuf>,
    splitter: &RecursiveCharacterTextSplitter,
) -> Result<Vec<Document>, IngestionError> {
    let documents = load_files_async(paths).await?;
    Ok(splitter.split_documents(&documents))
}
