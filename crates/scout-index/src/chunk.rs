//! The chunk data model shared by every extractor.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of semantic unit a chunk represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Function,
    Method,
    Class,
    Struct,
    Interface,
    Trait,
    Enum,
    Module,
    Document,
    Section,
    Content,
    /// Output of the naive fallback splitter.
    Generic,
}

impl ChunkType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
            Self::Module => "module",
            Self::Document => "document",
            Self::Section => "section",
            Self::Content => "content",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "function" => Self::Function,
            "method" => Self::Method,
            "class" => Self::Class,
            "struct" => Self::Struct,
            "interface" => Self::Interface,
            "trait" => Self::Trait,
            "enum" => Self::Enum,
            "module" => Self::Module,
            "document" => Self::Document,
            "section" => Self::Section,
            "content" => Self::Content,
            "generic" | "" => Self::Generic,
            other => return Err(format!("unknown chunk type: {other}")),
        })
    }
}

/// Vector space a chunk is embedded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingType {
    Code,
    Docs,
}

impl EmbeddingType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Docs => "docs",
        }
    }
}

impl fmt::Display for EmbeddingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "docs" => Ok(Self::Docs),
            other => Err(format!("unknown embedding type: {other}")),
        }
    }
}

/// Metadata keys attached to chunks.
pub mod keys {
    pub const PACKAGE: &str = "package";
    pub const IMPORTS: &str = "imports";
    pub const LANGUAGE: &str = "language";
    pub const RECEIVER: &str = "receiver";
    pub const SIGNATURE: &str = "signature";
    pub const DOC_COMMENT: &str = "doc_comment";
    pub const FIELDS: &str = "fields";
    pub const HEADING: &str = "heading";
    pub const HEADING_LEVEL: &str = "heading_level";
    pub const PARENT_HEADING: &str = "parent_heading";
    pub const FILENAME: &str = "filename";
}

/// One semantic unit of source or prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub file_path: String,
    /// 1-indexed, inclusive.
    pub line_start: usize,
    /// 1-indexed, inclusive.
    pub line_end: usize,
    pub language: String,
    pub content: String,
    pub chunk_type: ChunkType,
    pub name: String,
    pub embedding_type: EmbeddingType,
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Create a chunk with a fresh id and empty metadata.
    #[must_use]
    pub fn new(
        file_path: &str,
        language: &str,
        content: String,
        (line_start, line_end): (usize, usize),
        chunk_type: ChunkType,
        embedding_type: EmbeddingType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_owned(),
            line_start,
            line_end,
            language: language.to_owned(),
            content,
            chunk_type,
            name: String::new(),
            embedding_type,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Insert a metadata entry, skipping empty values.
    pub fn set_meta(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.metadata.insert(key.to_owned(), value);
        }
    }

    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_type_round_trips_through_str() {
        for ty in [
            ChunkType::Function,
            ChunkType::Method,
            ChunkType::Struct,
            ChunkType::Trait,
            ChunkType::Section,
            ChunkType::Generic,
        ] {
            assert_eq!(ty.as_str().parse::<ChunkType>().unwrap(), ty);
        }
    }

    #[test]
    fn empty_chunk_type_parses_as_generic() {
        assert_eq!("".parse::<ChunkType>().unwrap(), ChunkType::Generic);
        assert!("widget".parse::<ChunkType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&EmbeddingType::Docs).unwrap();
        assert_eq!(json, "\"docs\"");
    }

    #[test]
    fn set_meta_skips_empty_values() {
        let mut chunk = Chunk::new(
            "a.go",
            "go",
            "func a() {}".into(),
            (1, 1),
            ChunkType::Function,
            EmbeddingType::Code,
        );
        chunk.set_meta(keys::RECEIVER, "");
        chunk.set_meta(keys::PACKAGE, "main");
        assert_eq!(chunk.meta(keys::RECEIVER), None);
        assert_eq!(chunk.meta(keys::PACKAGE), Some("main"));
    }

    #[test]
    fn ids_are_unique() {
        let a = Chunk::new("a", "go", "x".into(), (1, 1), ChunkType::Generic, EmbeddingType::Code);
        let b = Chunk::new("a", "go", "x".into(), (1, 1), ChunkType::Generic, EmbeddingType::Code);
        assert_ne!(a.id, b.id);
    }
}
