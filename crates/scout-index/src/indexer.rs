//! Project indexing orchestrator: scan → diff → chunk → embed → store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use scout_llm::EmbeddingProvider;
use serde::Serialize;

use crate::chunk::{Chunk, EmbeddingType};
use crate::chunker::chunk_file;
use crate::embedder::{EmbedOutcome, EmbedderConfig, embed_texts};
use crate::error::{IndexError, Result};
use crate::languages::detect_language;
use crate::metadata::{IndexMetadata, MetadataStore};
use crate::scanner::{FileRecord, scan_files};
use crate::store::ChunkStore;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub embed: EmbedderConfig,
    /// Directory under the project root holding persisted state.
    pub data_dir: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            embed: EmbedderConfig::default(),
            data_dir: ".scout".into(),
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub chunks_created: usize,
    pub code_chunks: usize,
    pub docs_chunks: usize,
    pub provider_calls: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// How the current scan differs from the last committed pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    /// New and modified files, in scan order.
    pub to_index: Vec<FileRecord>,
    /// Previously indexed files with a strictly newer modification time.
    pub modified: Vec<String>,
    /// Previously indexed files missing from the scan.
    pub deleted: Vec<String>,
    pub unchanged: usize,
}

impl IndexPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_index.is_empty() && self.deleted.is_empty()
    }

    /// Paths whose stored chunks must go before new ones are inserted.
    ///
    /// New files are included: a pass that stored chunks but never committed
    /// its metadata leaves rows the next pass would otherwise duplicate.
    #[must_use]
    pub fn evictions(&self) -> Vec<String> {
        self.to_index
            .iter()
            .map(|f| f.path.clone())
            .chain(self.deleted.iter().cloned())
            .collect()
    }
}

/// Classify every scanned file against the persisted modification times.
#[must_use]
pub fn plan(files: &[FileRecord], metadata: &IndexMetadata) -> IndexPlan {
    let mut out = IndexPlan::default();
    let mut seen = HashSet::with_capacity(files.len());

    for file in files {
        seen.insert(file.path.as_str());
        match metadata.file_mod_times.get(&file.path) {
            None => out.to_index.push(file.clone()),
            Some(previous) if file.mod_time > *previous => {
                out.modified.push(file.path.clone());
                out.to_index.push(file.clone());
            }
            Some(_) => out.unchanged += 1,
        }
    }

    out.deleted = metadata
        .file_mod_times
        .keys()
        .filter(|path| !seen.contains(path.as_str()))
        .cloned()
        .collect();
    out
}

/// Orchestrates incremental indexing of a project tree.
pub struct CodeIndexer<P> {
    store: ChunkStore,
    code: Arc<P>,
    docs: Arc<P>,
    config: IndexerConfig,
}

impl<P: EmbeddingProvider + 'static> CodeIndexer<P> {
    /// `code` embeds source chunks, `docs` embeds prose chunks.
    #[must_use]
    pub fn new(store: ChunkStore, code: Arc<P>, docs: Arc<P>, config: IndexerConfig) -> Self {
        Self {
            store,
            code,
            docs,
            config,
        }
    }

    /// Run one incremental pass over `root`.
    ///
    /// Unchanged files are skipped; every other scanned or deleted path is
    /// evicted from the store before fresh chunks are inserted. Metadata is committed
    /// only after the store accepted every write.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning, embedding, the store or the metadata file
    /// fails, or if no candidate file has a usable language.
    pub async fn index_project(&self, root: &Path) -> Result<IndexReport> {
        let start = std::time::Instant::now();
        let mut report = IndexReport::default();

        let metadata_store = MetadataStore::in_dir(&root.join(&self.config.data_dir));
        let mut metadata = metadata_store.load().await?;

        let files = scan_files(root, &self.config.data_dir)?;
        report.files_scanned = files.len();

        let plan = plan(&files, &metadata);
        report.files_unchanged = plan.unchanged;

        if plan.is_empty() {
            tracing::info!(files = files.len(), "index up to date");
            report.duration_ms = elapsed_ms(start);
            return Ok(report);
        }

        tracing::info!(
            to_index = plan.to_index.len(),
            modified = plan.modified.len(),
            deleted = plan.deleted.len(),
            unchanged = plan.unchanged,
            "indexing started"
        );

        let mut chunks = Vec::new();
        let mut indexed = Vec::with_capacity(plan.to_index.len());
        let mut first_unsupported = None;
        let mut unsupported = 0usize;

        for file in &plan.to_index {
            match self.chunk_record(root, file).await {
                Ok(file_chunks) => {
                    tracing::debug!(file = %file.path, chunks = file_chunks.len(), "chunked");
                    chunks.extend(file_chunks);
                    indexed.push(file);
                }
                Err(e @ IndexError::UnsupportedLanguage(_)) => {
                    unsupported += 1;
                    report.errors.push(format!("{}: {e}", file.path));
                    first_unsupported.get_or_insert(e);
                }
                Err(e) => {
                    tracing::warn!(file = %file.path, error = %e, "skipping file");
                    report.errors.push(format!("{}: {e}", file.path));
                }
            }
        }

        if unsupported > 0
            && unsupported == plan.to_index.len()
            && let Some(e) = first_unsupported
        {
            return Err(e);
        }

        let vectors = self.embed_chunks(&chunks, &mut report).await?;

        self.store.ensure().await?;
        let evictions = plan.evictions();
        if !evictions.is_empty() {
            tracing::info!(files = evictions.len(), "removing stale chunks");
            self.store.remove_files(&evictions).await?;
        }
        if !chunks.is_empty() {
            self.store.insert(&chunks, &vectors).await?;
        }

        metadata.last_index_time = Some(Utc::now());
        for path in &evictions {
            metadata.file_mod_times.remove(path);
        }
        for file in &indexed {
            metadata
                .file_mod_times
                .insert(file.path.clone(), file.mod_time);
        }
        metadata_store.save(&metadata).await?;

        report.files_indexed = indexed.len();
        report.files_removed = plan.deleted.len();
        report.chunks_created = chunks.len();
        report.duration_ms = elapsed_ms(start);
        tracing::info!(
            files = report.files_indexed,
            chunks = report.chunks_created,
            removed = report.files_removed,
            provider_calls = report.provider_calls,
            duration_ms = report.duration_ms,
            "indexing complete"
        );
        Ok(report)
    }

    async fn chunk_record(&self, root: &Path, file: &FileRecord) -> Result<Vec<Chunk>> {
        let bytes = tokio::fs::read(root.join(&file.path)).await?;
        let source = String::from_utf8(bytes).unwrap_or_else(|e| {
            tracing::debug!(file = %file.path, "invalid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        });
        let rel = Path::new(&file.path);
        let lang = detect_language(rel, &source)
            .ok_or_else(|| IndexError::UnsupportedLanguage(rel.to_path_buf()))?;
        Ok(chunk_file(&source, &file.path, lang))
    }

    /// Code pass then docs pass; vectors come back in chunk order.
    async fn embed_chunks(&self, chunks: &[Chunk], report: &mut IndexReport) -> Result<Vec<Vec<f32>>> {
        let mut vectors = vec![Vec::new(); chunks.len()];

        for (kind, provider) in [
            (EmbeddingType::Code, &self.code),
            (EmbeddingType::Docs, &self.docs),
        ] {
            let (positions, texts): (Vec<usize>, Vec<String>) = chunks
                .iter()
                .enumerate()
                .filter(|(_, c)| c.embedding_type == kind)
                .map(|(i, c)| (i, c.content.clone()))
                .unzip();
            if texts.is_empty() {
                continue;
            }

            tracing::info!(pass = %kind, chunks = texts.len(), model = provider.model(), "embedding");
            let EmbedOutcome {
                vectors: pass_vectors,
                provider_calls,
                duplicates,
            } = embed_texts(provider, &texts, self.config.embed).await?;

            match kind {
                EmbeddingType::Code => report.code_chunks = texts.len(),
                EmbeddingType::Docs => report.docs_chunks = texts.len(),
            }
            report.provider_calls += provider_calls;
            report.duplicates_skipped += duplicates;

            for (position, vector) in positions.into_iter().zip(pass_vectors) {
                vectors[position] = vector;
            }
        }
        Ok(vectors)
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone};

    use super::*;
    use crate::languages::Lang;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record(path: &str, secs: i64) -> FileRecord {
        FileRecord {
            path: path.into(),
            language: Lang::Go,
            mod_time: at(secs),
        }
    }

    fn metadata(entries: &[(&str, i64)]) -> IndexMetadata {
        IndexMetadata {
            last_index_time: Some(at(0)),
            file_mod_times: entries
                .iter()
                .map(|(p, s)| ((*p).to_owned(), at(*s)))
                .collect(),
        }
    }

    #[test]
    fn first_run_indexes_everything() {
        let files = [record("a.go", 0), record("b.go", 0)];
        let p = plan(&files, &IndexMetadata::default());
        assert_eq!(p.to_index.len(), 2);
        assert!(p.modified.is_empty());
        assert!(p.deleted.is_empty());
        assert_eq!(p.unchanged, 0);
    }

    #[test]
    fn classifies_each_change_kind() {
        let files = [record("new.go", 5), record("mod.go", 10), record("same.go", 3)];
        let meta = metadata(&[("mod.go", 9), ("same.go", 3), ("gone.go", 1)]);

        let p = plan(&files, &meta);

        let paths: Vec<_> = p.to_index.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["new.go", "mod.go"]);
        assert_eq!(p.modified, ["mod.go"]);
        assert_eq!(p.deleted, ["gone.go"]);
        assert_eq!(p.unchanged, 1);
        assert_eq!(p.evictions(), ["new.go", "mod.go", "gone.go"]);
    }

    #[test]
    fn older_timestamp_is_unchanged() {
        let files = [record("a.go", 1)];
        let meta = metadata(&[("a.go", 2)]);
        let p = plan(&files, &meta);
        assert!(p.is_empty());
        assert_eq!(p.unchanged, 1);
    }

    #[test]
    fn subsecond_touch_counts_as_modified() {
        let mut file = record("a.go", 2);
        file.mod_time += Duration::milliseconds(1);
        let p = plan(&[file], &metadata(&[("a.go", 2)]));
        assert_eq!(p.modified, ["a.go"]);
    }

    #[test]
    fn delete_only_plan_is_not_empty() {
        let p = plan(&[], &metadata(&[("a.go", 0)]));
        assert!(!p.is_empty());
        assert!(p.to_index.is_empty());
        assert_eq!(p.evictions(), ["a.go"]);
    }

    #[test]
    fn index_report_defaults() {
        let report = IndexReport::default();
        assert_eq!(report.files_scanned, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn default_config() {
        let config = IndexerConfig::default();
        assert_eq!(config.data_dir, ".scout");
        assert_eq!(config.embed.workers, 10);
    }
}
