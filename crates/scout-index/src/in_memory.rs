//! Process-local vector store using exact Euclidean search.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::store::{
    BoxFuture, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    points: HashMap<String, StoredPoint>,
}

pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of points in `collection`, zero when it does not exist.
    #[must_use]
    pub fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|cols| cols.get(collection).map_or(0, |c| c.points.len()))
            .unwrap_or(0)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let d = a.get(i).copied().unwrap_or(0.0) - b.get(i).copied().unwrap_or(0.0);
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

fn matches_filter(payload: &HashMap<String, serde_json::Value>, filter: &VectorFilter) -> bool {
    for cond in &filter.must {
        let Some(val) = payload.get(&cond.field) else {
            return false;
        };
        if !field_matches(val, &cond.value) {
            return false;
        }
    }
    if !filter.should.is_empty() {
        return filter.should.iter().any(|cond| {
            payload
                .get(&cond.field)
                .is_some_and(|val| field_matches(val, &cond.value))
        });
    }
    true
}

fn field_matches(val: &serde_json::Value, expected: &str) -> bool {
    val.as_str() == Some(expected)
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection).or_insert_with(|| InMemoryCollection {
                points: HashMap::new(),
            });
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Delete(format!("collection {collection} not found"))
            })?;
            col.points
                .retain(|_, point| !matches_filter(&point.payload, &filter));
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let empty_filter = VectorFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .filter(|(_, sp)| matches_filter(&sp.payload, f))
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: euclidean_distance(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.id.cmp(&b.id)));
            #[allow(clippy::cast_possible_truncation)]
            scored.truncate(limit as usize);

            Ok(scored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldCondition;

    fn point(id: &str, vector: Vec<f32>, path: &str) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("file_path".into(), serde_json::json!(path))]),
        }
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("c").await.unwrap());
        store.ensure_collection("c", 4).await.unwrap();
        store.upsert("c", vec![point("1", vec![1.0], "a")]).await.unwrap();
        store.ensure_collection("c", 4).await.unwrap();
        assert!(store.collection_exists("c").await.unwrap());
        assert_eq!(store.point_count("c"), 1);
    }

    #[tokio::test]
    async fn search_orders_by_ascending_distance() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("far", vec![10.0, 0.0], "a"),
                    point("near", vec![1.0, 0.0], "b"),
                    point("exact", vec![0.0, 0.0], "c"),
                ],
            )
            .await
            .unwrap();

        let rows = store.search("c", vec![0.0, 0.0], 2, None).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["exact", "near"]);
        assert!(rows[0].score <= rows[1].score);
    }

    #[tokio::test]
    async fn search_applies_must_filter() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1).await.unwrap();
        store
            .upsert("c", vec![point("1", vec![0.0], "a"), point("2", vec![5.0], "b")])
            .await
            .unwrap();

        let filter = VectorFilter {
            must: vec![FieldCondition::text("file_path", "b")],
            ..VectorFilter::default()
        };
        let rows = store.search("c", vec![0.0], 10, Some(filter)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "2");
    }

    #[tokio::test]
    async fn delete_by_should_filter_removes_any_match() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("1", vec![0.0], "a"),
                    point("2", vec![0.0], "b"),
                    point("3", vec![0.0], "c"),
                ],
            )
            .await
            .unwrap();

        let filter = VectorFilter {
            should: vec![
                FieldCondition::text("file_path", "a"),
                FieldCondition::text("file_path", "c"),
            ],
            ..VectorFilter::default()
        };
        store.delete_by_filter("c", filter).await.unwrap();

        let rows = store.search("c", vec![0.0], 10, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "2");
    }

    #[tokio::test]
    async fn missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        assert!(store.search("nope", vec![0.0], 1, None).await.is_err());
        assert!(store.upsert("nope", vec![]).await.is_err());
    }

    #[test]
    fn distance_treats_missing_components_as_zero() {
        assert!((euclidean_distance(&[3.0, 4.0], &[0.0]) - 5.0).abs() < 1e-6);
    }
}
