//! Blank-line splitter used when no declaration extractor applies.

use crate::chunk::{Chunk, ChunkType, EmbeddingType};

/// Split `source` into runs of non-blank lines.
///
/// Never fails: empty or whitespace-only input yields no chunks.
#[must_use]
pub fn split(
    source: &str,
    file_path: &str,
    language: &str,
    embedding_type: EmbeddingType,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 1;

    let mut flush = |run: &mut Vec<&str>, start: usize| {
        if run.is_empty() {
            return;
        }
        let end = start + run.len() - 1;
        chunks.push(Chunk::new(
            file_path,
            language,
            run.join("\n"),
            (start, end),
            ChunkType::Generic,
            embedding_type,
        ));
        run.clear();
    };

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            flush(&mut run, run_start);
            run_start = line_no + 1;
        } else {
            run.push(line);
        }
    }
    flush(&mut run, run_start);

    chunks
}
