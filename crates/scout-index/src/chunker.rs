//! Routes a file to the right chunker and absorbs parse failures.

use crate::chunk::Chunk;
use crate::extractor;
use crate::heading;
use crate::languages::Lang;
use crate::naive;

/// Chunk one file's content.
///
/// Prose goes through the heading chunker, grammar-backed code through the
/// declaration extractor. Parse failures, languages without a grammar, and
/// files with no recognised declarations fall back to the naive splitter.
#[must_use]
pub fn chunk_file(source: &str, file_path: &str, lang: Lang) -> Vec<Chunk> {
    match lang {
        Lang::Markdown => return heading::chunk_markdown(source, file_path),
        Lang::Text | Lang::Rst => return heading::chunk_whole(source, file_path, lang.id()),
        _ => {}
    }

    if !lang.is_supported() {
        tracing::debug!(file = file_path, lang = %lang, "no extractor, using naive splitter");
        return naive::split(source, file_path, lang.id(), lang.embedding_type());
    }

    match extractor::extract(source, file_path, lang) {
        Ok(chunks) if !chunks.is_empty() => chunks,
        Ok(_) => naive::split(source, file_path, lang.id(), lang.embedding_type()),
        Err(e) => {
            tracing::warn!(file = file_path, "falling back to naive splitter: {e}");
            naive::split(source, file_path, lang.id(), lang.embedding_type())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkType, EmbeddingType};

    #[test]
    fn markdown_routes_to_heading_chunker() {
        let chunks = chunk_file("# A\ntext\n## B\nmore\n", "README.md", Lang::Markdown);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.embedding_type == EmbeddingType::Docs));
    }

    #[test]
    fn rst_is_one_document() {
        let chunks = chunk_file("Title\n=====\n\nBody\n", "guide.rst", Lang::Rst);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Document);
        assert_eq!(chunks[0].language, "rst");
    }

    #[test]
    fn ruby_uses_naive_splitter() {
        let chunks = chunk_file("def a\nend\n\ndef b\nend\n", "app.rb", Lang::Ruby);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::Generic));
        assert!(chunks.iter().all(|c| c.embedding_type == EmbeddingType::Code));
    }

    #[test]
    fn empty_code_file_yields_nothing() {
        assert!(chunk_file("", "empty.rb", Lang::Ruby).is_empty());
    }

    #[cfg(feature = "lang-python")]
    #[test]
    fn script_without_declarations_falls_back() {
        let chunks = chunk_file("import os\n\nprint(os.getcwd())\n", "run.py", Lang::Python);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.name.is_empty()));
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::Generic));
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn malformed_source_falls_back() {
        let chunks = chunk_file("}}}} ((( package", "bad.go", Lang::Go);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Generic);
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn go_declarations_extracted() {
        let source = "package main\n\nfunc a() {}\n\nfunc b() {}\n";
        let chunks = chunk_file(source, "main.go", Lang::Go);
        let names: Vec<_> = chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
