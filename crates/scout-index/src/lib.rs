//! Incremental semantic indexing of source trees.
//!
//! Files are routed to a language, split into declaration-level chunks by a
//! tree-sitter rule registry (or by headings for prose), embedded through a
//! deduplicating worker pool and written to a vector store. The query path
//! embeds the search text, runs a nearest-neighbour search per vector space and
//! collapses rows that share identical content.

pub mod chunk;
pub mod chunker;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod heading;
pub mod in_memory;
pub mod indexer;
pub mod languages;
pub mod metadata;
pub mod naive;
pub mod qdrant;
pub mod retriever;
pub(crate) mod rules;
pub mod scanner;
pub mod store;

pub use chunk::{Chunk, ChunkType, EmbeddingType};
pub use error::{IndexError, Result};
pub use indexer::{CodeIndexer, IndexReport};
pub use languages::{Lang, detect_language};
pub use retriever::{CodeRetriever, SearchMode};
pub use store::{ChunkStore, SearchHit, VectorStore, VectorStoreError};
