//! Vector store contract and the typed chunk adapter on top of it.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::chunk::{Chunk, ChunkType, EmbeddingType};

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("delete error: {0}")]
    Delete(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// Exact-match payload filter. `should` matches when any condition holds.
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub must: Vec<FieldCondition>,
    pub should: Vec<FieldCondition>,
}

/// Keyword equality on one payload field.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: String,
    pub value: String,
}

impl FieldCondition {
    #[must_use]
    pub fn text(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            value: value.into(),
        }
    }
}

/// Search row. `score` is a distance: smaller is closer.
#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Nearest-neighbour store used by the pipeline.
///
/// `upsert` and `delete_by_filter` must be durable and visible to `search`
/// when their futures resolve.
pub trait VectorStore: Send + Sync {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>>;

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Rows ordered by ascending distance.
    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>>;
}

const UPSERT_BATCH: usize = 256;
const DELETE_BATCH: usize = 128;

/// Payload field names of stored chunks.
pub mod fields {
    pub const CHUNK_ID: &str = "chunk_id";
    pub const FILE_PATH: &str = "file_path";
    pub const LINE_START: &str = "line_start";
    pub const LINE_END: &str = "line_end";
    pub const LANGUAGE: &str = "language";
    pub const CONTENT: &str = "content";
    pub const CHUNK_TYPE: &str = "chunk_type";
    pub const NAME: &str = "name";
    pub const EMBEDDING_TYPE: &str = "embedding_type";
    pub const METADATA: &str = "metadata";
}

/// One stored chunk returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub file_path: String,
    pub line_start: usize,
    pub line_end: usize,
    pub language: String,
    pub content: String,
    pub chunk_type: Option<ChunkType>,
    pub name: Option<String>,
    pub embedding_type: Option<EmbeddingType>,
    pub metadata: BTreeMap<String, String>,
    pub score: f32,
}

impl SearchHit {
    /// Decode a raw row. Rows missing a path, content or line range are
    /// rejected.
    #[must_use]
    pub fn from_scored_point(point: &ScoredVectorPoint) -> Option<Self> {
        let payload = &point.payload;
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(str::to_owned);
        let line = |key: &str| {
            payload
                .get(key)
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| usize::try_from(v).ok())
        };

        let metadata = text(fields::METADATA)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Some(Self {
            chunk_id: text(fields::CHUNK_ID).unwrap_or_else(|| point.id.clone()),
            file_path: text(fields::FILE_PATH)?,
            line_start: line(fields::LINE_START)?,
            line_end: line(fields::LINE_END)?,
            language: text(fields::LANGUAGE).unwrap_or_default(),
            content: text(fields::CONTENT)?,
            chunk_type: text(fields::CHUNK_TYPE).and_then(|t| t.parse().ok()),
            name: text(fields::NAME).filter(|n| !n.is_empty()),
            embedding_type: text(fields::EMBEDDING_TYPE).and_then(|t| t.parse().ok()),
            metadata,
            score: point.score,
        })
    }
}

fn chunk_payload(chunk: &Chunk) -> Result<HashMap<String, serde_json::Value>, VectorStoreError> {
    let metadata = serde_json::to_string(&chunk.metadata)
        .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
    let payload = serde_json::json!({
        fields::CHUNK_ID: chunk.id,
        fields::FILE_PATH: chunk.file_path,
        fields::LINE_START: chunk.line_start,
        fields::LINE_END: chunk.line_end,
        fields::LANGUAGE: chunk.language,
        fields::CONTENT: chunk.content,
        fields::CHUNK_TYPE: chunk.chunk_type.as_str(),
        fields::NAME: chunk.name,
        fields::EMBEDDING_TYPE: chunk.embedding_type.as_str(),
        fields::METADATA: metadata,
    });
    match payload {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(VectorStoreError::Serialization(
            "chunk payload is not an object".into(),
        )),
    }
}

/// Chunk-level operations over a [`VectorStore`] collection.
#[derive(Clone)]
pub struct ChunkStore {
    store: Arc<dyn VectorStore>,
    collection: String,
    dimension: usize,
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl ChunkStore {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            dimension,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// # Errors
    ///
    /// Returns an error if the collection cannot be created.
    pub async fn ensure(&self) -> Result<(), VectorStoreError> {
        self.store
            .ensure_collection(&self.collection, self.dimension as u64)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    pub async fn exists(&self) -> Result<bool, VectorStoreError> {
        self.store.collection_exists(&self.collection).await
    }

    /// Store chunks with their vectors (same order, same length).
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ or an upsert fails.
    pub async fn insert(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<(), VectorStoreError> {
        if chunks.len() != vectors.len() {
            return Err(VectorStoreError::Upsert(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        for (chunk_batch, vector_batch) in chunks.chunks(UPSERT_BATCH).zip(vectors.chunks(UPSERT_BATCH)) {
            let points = chunk_batch
                .iter()
                .zip(vector_batch)
                .map(|(chunk, vector)| {
                    Ok(VectorPoint {
                        id: chunk.id.clone(),
                        vector: vector.clone(),
                        payload: chunk_payload(chunk)?,
                    })
                })
                .collect::<Result<Vec<_>, VectorStoreError>>()?;
            self.store.upsert(&self.collection, points).await?;
        }
        Ok(())
    }

    /// Delete every chunk whose `file_path` is one of `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub async fn remove_files(&self, paths: &[String]) -> Result<(), VectorStoreError> {
        for batch in paths.chunks(DELETE_BATCH) {
            let filter = VectorFilter {
                should: batch
                    .iter()
                    .map(|p| FieldCondition::text(fields::FILE_PATH, p.as_str()))
                    .collect(),
                ..VectorFilter::default()
            };
            self.store.delete_by_filter(&self.collection, filter).await?;
        }
        Ok(())
    }

    /// Nearest chunks to `vector`, optionally restricted to one vector space.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        embedding_type: Option<EmbeddingType>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let filter = embedding_type.map(|t| VectorFilter {
            must: vec![FieldCondition::text(fields::EMBEDDING_TYPE, t.as_str())],
            ..VectorFilter::default()
        });
        let rows = self
            .store
            .search(&self.collection, vector, limit as u64, filter)
            .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            match SearchHit::from_scored_point(row) {
                Some(hit) => hits.push(hit),
                None => tracing::warn!(id = %row.id, "dropping search row with incomplete payload"),
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        let mut c = Chunk::new(
            "src/lib.rs",
            "rust",
            "fn a() {}".into(),
            (3, 5),
            ChunkType::Function,
            EmbeddingType::Code,
        )
        .with_name("a");
        c.set_meta("signature", "()");
        c
    }

    #[test]
    fn payload_round_trips_into_hit() {
        let c = chunk();
        let point = ScoredVectorPoint {
            id: c.id.clone(),
            score: 0.25,
            payload: chunk_payload(&c).unwrap(),
        };
        let hit = SearchHit::from_scored_point(&point).unwrap();
        assert_eq!(hit.chunk_id, c.id);
        assert_eq!(hit.file_path, "src/lib.rs");
        assert_eq!((hit.line_start, hit.line_end), (3, 5));
        assert_eq!(hit.chunk_type, Some(ChunkType::Function));
        assert_eq!(hit.name.as_deref(), Some("a"));
        assert_eq!(hit.embedding_type, Some(EmbeddingType::Code));
        assert_eq!(hit.metadata.get("signature").map(String::as_str), Some("()"));
        assert!((hit.score - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn incomplete_payload_is_rejected() {
        let point = ScoredVectorPoint {
            id: "x".into(),
            score: 1.0,
            payload: HashMap::from([(
                fields::FILE_PATH.to_owned(),
                serde_json::json!("a.go"),
            )]),
        };
        assert!(SearchHit::from_scored_point(&point).is_none());
    }

    #[test]
    fn empty_name_decodes_as_none() {
        let mut c = chunk();
        c.name.clear();
        c.chunk_type = ChunkType::Generic;
        let point = ScoredVectorPoint {
            id: c.id.clone(),
            score: 0.0,
            payload: chunk_payload(&c).unwrap(),
        };
        let hit = SearchHit::from_scored_point(&point).unwrap();
        assert!(hit.name.is_none());
        assert_eq!(hit.chunk_type, Some(ChunkType::Generic));
    }

    #[test]
    fn missing_chunk_id_falls_back_to_point_id() {
        let c = chunk();
        let mut payload = chunk_payload(&c).unwrap();
        payload.remove(fields::CHUNK_ID);
        let point = ScoredVectorPoint {
            id: "point-1".into(),
            score: 0.0,
            payload,
        };
        assert_eq!(SearchHit::from_scored_point(&point).unwrap().chunk_id, "point-1");
    }
}
