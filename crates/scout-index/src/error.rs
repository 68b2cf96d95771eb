//! Error types for scout-index.

use std::path::PathBuf;

use crate::store::VectorStoreError;

/// Errors that can occur during indexing and search.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking the source tree failed.
    #[error("scan failed: {0}")]
    Scan(String),

    /// Tree-sitter could not produce a usable syntax tree.
    #[error("parse failed: {0}")]
    Parse(String),

    /// No language could be determined for the file.
    #[error("unsupported language: {}", .0.display())]
    UnsupportedLanguage(PathBuf),

    /// Embedding provider failed after exhausting retries.
    #[error("{provider} embedding failed after {attempts} attempts: {source}")]
    Provider {
        provider: &'static str,
        attempts: u32,
        #[source]
        source: scout_llm::EmbedError,
    },

    /// Vector store error.
    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    /// Reading or writing the persisted index metadata failed.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A vector does not fit the configured storage width.
    #[error("embedding dimension {got} exceeds storage dimension {expected}")]
    Dimension { expected: usize, got: usize },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Search was requested before any index was built.
    #[error("index not found: run `scout index` first")]
    IndexNotFound,

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
