//! Heading-based chunking for prose files.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::chunk::{Chunk, ChunkType, EmbeddingType, keys};

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());

#[derive(Default)]
struct Section<'a> {
    lines: Vec<&'a str>,
    start: usize,
    heading: String,
    level: usize,
}

/// Split markdown into one chunk per heading section.
///
/// Headings inside fenced code blocks are ignored. Each section carries its
/// heading, level and the ` > `-joined lineage of enclosing headings.
#[must_use]
pub fn chunk_markdown(source: &str, file_path: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    // Enclosing headings as (level, text), shallowest first.
    let mut parents: Vec<(usize, String)> = Vec::new();
    let mut current = Section {
        start: 1,
        ..Section::default()
    };
    let mut fence: Option<&str> = None;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_start();
        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            current.lines.push(line);
            continue;
        }
        if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m)) {
            fence = Some(marker);
            current.lines.push(line);
            continue;
        }

        let Some(caps) = HEADING.captures(line) else {
            current.lines.push(line);
            continue;
        };
        let level = caps[1].len();
        let text = caps[2].trim().to_owned();

        if let Some(chunk) = section_chunk(&current, file_path, &parents) {
            chunks.push(chunk);
        }

        if !current.heading.is_empty() {
            parents.push((current.level, std::mem::take(&mut current.heading)));
        }
        while parents.last().is_some_and(|(l, _)| *l >= level) {
            parents.pop();
        }

        current = Section {
            lines: vec![line],
            start: line_no,
            heading: text,
            level,
        };
    }
    if let Some(chunk) = section_chunk(&current, file_path, &parents) {
        chunks.push(chunk);
    }

    if chunks.len() == 1 && chunks[0].name.is_empty() {
        let chunk = &mut chunks[0];
        chunk.chunk_type = ChunkType::Document;
        chunk.set_meta(keys::HEADING, basename(file_path));
    }
    chunks
}

/// One `document` chunk spanning the whole file, for unstructured text.
#[must_use]
pub fn chunk_whole(source: &str, file_path: &str, language: &str) -> Vec<Chunk> {
    if source.trim().is_empty() {
        return Vec::new();
    }
    let lines = source.lines().count().max(1);
    let mut chunk = Chunk::new(
        file_path,
        language,
        source.to_owned(),
        (1, lines),
        ChunkType::Document,
        EmbeddingType::Docs,
    );
    chunk.set_meta(keys::FILENAME, basename(file_path));
    vec![chunk]
}

fn section_chunk(
    section: &Section<'_>,
    file_path: &str,
    parents: &[(usize, String)],
) -> Option<Chunk> {
    let mut lines = section.lines.as_slice();
    while let Some((last, rest)) = lines.split_last() {
        if !last.trim().is_empty() {
            break;
        }
        lines = rest;
    }
    if lines.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    let chunk_type = if section.heading.is_empty() {
        ChunkType::Content
    } else {
        ChunkType::Section
    };
    let mut chunk = Chunk::new(
        file_path,
        "markdown",
        lines.join("\n"),
        (section.start, section.start + lines.len() - 1),
        chunk_type,
        EmbeddingType::Docs,
    )
    .with_name(section.heading.as_str());

    if !section.heading.is_empty() {
        chunk.set_meta(keys::HEADING, section.heading.as_str());
        chunk.set_meta(keys::HEADING_LEVEL, section.level.to_string());
    }
    let lineage: Vec<&str> = parents.iter().map(|(_, h)| h.as_str()).collect();
    chunk.set_meta(keys::PARENT_HEADING, lineage.join(" > "));
    Some(chunk)
}

fn basename(file_path: &str) -> String {
    Path::new(file_path)
        .file_name()
        .map_or_else(|| file_path.to_owned(), |n| n.to_string_lossy().into_owned())
}
