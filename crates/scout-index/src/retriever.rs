//! Query path: embed the search text, search per vector space, collapse
//! duplicate rows.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use scout_llm::EmbeddingProvider;
use serde::{Deserialize, Serialize};

use crate::chunk::EmbeddingType;
use crate::embedder::{EmbedderConfig, embed_with_retry, pad_to};
use crate::error::{IndexError, Result};
use crate::store::{ChunkStore, SearchHit};

/// Which vector spaces a query searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Code,
    Docs,
    Hybrid,
}

impl SearchMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Docs => "docs",
            Self::Hybrid => "hybrid",
        }
    }

    fn spaces(self) -> &'static [EmbeddingType] {
        match self {
            Self::Code => &[EmbeddingType::Code],
            Self::Docs => &[EmbeddingType::Docs],
            Self::Hybrid => &[EmbeddingType::Code, EmbeddingType::Docs],
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "docs" => Ok(Self::Docs),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!(
                "unknown search mode `{other}` (expected code, docs or hybrid)"
            )),
        }
    }
}

pub struct CodeRetriever<P> {
    store: ChunkStore,
    code: Arc<P>,
    docs: Arc<P>,
    config: EmbedderConfig,
}

impl<P: EmbeddingProvider> CodeRetriever<P> {
    #[must_use]
    pub fn new(store: ChunkStore, code: Arc<P>, docs: Arc<P>, config: EmbedderConfig) -> Self {
        Self {
            store,
            code,
            docs,
            config,
        }
    }

    /// Up to `limit` distinct chunks closest to `query`, nearest first.
    ///
    /// Each vector space is searched with the query embedded by that space's
    /// model; twice the limit is fetched so that collapsing duplicates can
    /// still fill the page.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IndexNotFound`] when nothing was indexed yet, or
    /// an error if embedding or the store fails.
    pub async fn search(&self, query: &str, mode: SearchMode, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        if !self.store.exists().await? {
            return Err(IndexError::IndexNotFound);
        }

        let fetch = limit.saturating_mul(2);
        let mut rows = Vec::new();
        for &space in mode.spaces() {
            let provider = match space {
                EmbeddingType::Code => &self.code,
                EmbeddingType::Docs => &self.docs,
            };
            let vector = embed_with_retry(provider.as_ref(), query, &self.config).await?;
            let vector = pad_to(vector, self.store.dimension())?;
            let hits = self.store.search(vector, fetch, Some(space)).await?;
            tracing::debug!(%space, hits = hits.len(), "searched vector space");
            rows.extend(hits);
        }

        let mut results = dedup_results(rows);
        results.truncate(limit);
        tracing::debug!(%mode, returned = results.len(), "search complete");
        Ok(results)
    }
}

/// Collapse rows with identical content to the best-scoring one, ordered by
/// ascending score.
#[must_use]
pub fn dedup_results(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let mut best: HashMap<String, SearchHit> = HashMap::with_capacity(hits.len());
    for hit in hits {
        match best.get_mut(&hit.content) {
            Some(kept) if hit.score < kept.score => *kept = hit,
            Some(_) => {}
            None => {
                best.insert(hit.content.clone(), hit);
            }
        }
    }

    let mut out: Vec<SearchHit> = best.into_values().collect();
    out.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.line_start.cmp(&b.line_start))
    });
    out
}
