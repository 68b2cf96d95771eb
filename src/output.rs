//! Terminal and JSON rendering of command results.

use std::fmt::Write;

use scout_index::{IndexReport, SearchHit, SearchMode};
use serde::Serialize;

const PREVIEW_CHARS: usize = 100;

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    mode: SearchMode,
    total_results: usize,
    returned: usize,
    results: &'a [SearchHit],
}

pub fn render_json(query: &str, mode: SearchMode, hits: &[SearchHit]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SearchOutput {
        query,
        mode,
        total_results: hits.len(),
        returned: hits.len(),
        results: hits,
    })
}

pub fn render_text(query: &str, hits: &[SearchHit]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} results for: {query}\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {}:{}-{} (score: {:.4})",
            i + 1,
            hit.file_path,
            hit.line_start,
            hit.line_end,
            hit.score
        );
        let kind = hit
            .chunk_type
            .map_or_else(|| "chunk".to_owned(), |t| t.to_string());
        match &hit.name {
            Some(name) => {
                let _ = writeln!(out, "   {kind} {name} [{}]", hit.language);
            }
            None => {
                let _ = writeln!(out, "   {kind} [{}]", hit.language);
            }
        }
        let _ = writeln!(out, "   {}\n", preview(&hit.content));
    }
    out
}

pub fn render_report(report: &IndexReport) -> String {
    let mut out = String::new();
    if report.files_indexed == 0 && report.files_removed == 0 {
        let _ = writeln!(
            out,
            "All {} files up to date ({} ms)",
            report.files_unchanged, report.duration_ms
        );
    } else {
        let _ = writeln!(
            out,
            "Indexed {} files ({} unchanged, {} removed) in {} ms",
            report.files_indexed, report.files_unchanged, report.files_removed, report.duration_ms
        );
        let _ = writeln!(
            out,
            "Chunks: {} ({} code, {} docs); embedding calls: {}, duplicates skipped: {}",
            report.chunks_created,
            report.code_chunks,
            report.docs_chunks,
            report.provider_calls,
            report.duplicates_skipped
        );
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "{} files skipped:", report.errors.len());
        for error in &report.errors {
            let _ = writeln!(out, "  - {error}");
        }
    }
    out
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
