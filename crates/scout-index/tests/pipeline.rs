use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use scout_index::embedder::EmbedderConfig;
use scout_index::in_memory::InMemoryVectorStore;
use scout_index::indexer::{CodeIndexer, IndexerConfig};
use scout_index::metadata::MetadataStore;
use scout_index::retriever::{CodeRetriever, SearchMode};
use scout_index::store::{
    BoxFuture, ChunkStore, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
use scout_index::{EmbeddingType, IndexError};
use scout_llm::mock::MockEmbedder;

const DIM: usize = 256;
const COLLECTION: &str = "chunks";

/// In-memory store that counts every mutating call.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryVectorStore,
    mutations: AtomicUsize,
}

impl CountingStore {
    fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn points(&self) -> usize {
        self.inner.point_count(COLLECTION)
    }
}

impl VectorStore for CountingStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.inner.ensure_collection(collection, vector_size)
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        self.inner.collection_exists(collection)
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, points)
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_by_filter(collection, filter)
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        self.inner.search(collection, vector, limit, filter)
    }
}

struct Harness {
    dir: tempfile::TempDir,
    store: Arc<CountingStore>,
    code: Arc<MockEmbedder>,
    docs: Arc<MockEmbedder>,
    indexer: CodeIndexer<MockEmbedder>,
    retriever: CodeRetriever<MockEmbedder>,
}

fn embed_config() -> EmbedderConfig {
    EmbedderConfig {
        workers: 4,
        max_attempts: 2,
        base_backoff: Duration::from_millis(1),
        call_timeout: Duration::from_secs(5),
        dimension: DIM,
    }
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CountingStore::default());
    let chunks = ChunkStore::new(store.clone(), COLLECTION, DIM);
    let code = Arc::new(MockEmbedder::new(DIM).with_model("code"));
    let docs = Arc::new(MockEmbedder::new(DIM / 2).with_model("docs"));
    let config = IndexerConfig {
        embed: embed_config(),
        data_dir: ".scout".into(),
    };
    Harness {
        indexer: CodeIndexer::new(chunks.clone(), code.clone(), docs.clone(), config),
        retriever: CodeRetriever::new(chunks, code.clone(), docs.clone(), embed_config()),
        dir,
        store,
        code,
        docs,
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn seed(root: &Path) {
    write(
        root,
        "src/auth.go",
        "package auth\n\n// Login validates user credentials.\nfunc Login(user string, password string) bool {\n\treturn user != \"\" && password != \"\"\n}\n",
    );
    write(root, "src/math.py", "def add(a, b):\n    return a + b\n");
    write(
        root,
        "docs/guide.md",
        "# Authentication\n\nUsers log in with a password.\n\n## Tokens\n\nTokens expire after one hour.\n",
    );
}

#[tokio::test]
async fn indexes_code_and_docs_into_separate_spaces() {
    let h = harness();
    seed(h.dir.path());

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_indexed, 3);
    assert_eq!(report.code_chunks, 2);
    assert_eq!(report.docs_chunks, 2);
    assert_eq!(report.chunks_created, 4);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(h.store.points(), 4);
    assert_eq!(h.code.call_count(), 2);
    assert_eq!(h.docs.call_count(), 2);

    let meta = MetadataStore::in_dir(&h.dir.path().join(".scout"))
        .load()
        .await
        .unwrap();
    assert_eq!(meta.file_mod_times.len(), 3);
    assert!(meta.last_index_time.is_some());
}

#[tokio::test]
async fn code_mode_returns_only_code() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();

    let hits = h
        .retriever
        .search("Login user password", SearchMode::Code, 10)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.embedding_type == Some(EmbeddingType::Code)));
    assert_eq!(hits[0].file_path, "src/auth.go");
    assert_eq!(hits[0].name.as_deref(), Some("Login"));
}

#[tokio::test]
async fn docs_mode_returns_only_docs() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();

    let hits = h
        .retriever
        .search("tokens expire", SearchMode::Docs, 10)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.embedding_type == Some(EmbeddingType::Docs)));
    assert_eq!(hits[0].file_path, "docs/guide.md");
    assert!(hits[0].content.contains("Tokens expire"));
}

#[tokio::test]
async fn hybrid_mode_merges_both_spaces() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();

    let hits = h
        .retriever
        .search("password", SearchMode::Hybrid, 10)
        .await
        .unwrap();

    assert_eq!(hits.len(), 4);
    assert!(hits.iter().any(|h| h.embedding_type == Some(EmbeddingType::Code)));
    assert!(hits.iter().any(|h| h.embedding_type == Some(EmbeddingType::Docs)));
    assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));

    let limited = h
        .retriever
        .search("password", SearchMode::Hybrid, 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn second_pass_without_changes_touches_nothing() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();

    let mutations = h.store.mutations();
    let calls = h.code.call_count() + h.docs.call_count();
    let meta_path = h.dir.path().join(".scout/metadata.json");
    let meta_before = std::fs::read(&meta_path).unwrap();

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_unchanged, 3);
    assert_eq!(report.files_indexed, 0);
    assert_eq!(report.chunks_created, 0);
    assert_eq!(h.store.mutations(), mutations);
    assert_eq!(h.code.call_count() + h.docs.call_count(), calls);
    assert_eq!(std::fs::read(&meta_path).unwrap(), meta_before);
    assert_eq!(h.store.points(), 4);
}

#[tokio::test]
async fn deleted_file_leaves_no_chunks() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();

    std::fs::remove_file(h.dir.path().join("src/math.py")).unwrap();
    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_removed, 1);
    assert_eq!(report.files_indexed, 0);
    assert_eq!(h.store.points(), 3);

    let hits = h
        .retriever
        .search("add a b", SearchMode::Hybrid, 10)
        .await
        .unwrap();
    assert!(hits.iter().all(|h| h.file_path != "src/math.py"));

    let meta = MetadataStore::in_dir(&h.dir.path().join(".scout"))
        .load()
        .await
        .unwrap();
    assert!(!meta.file_mod_times.contains_key("src/math.py"));
}

#[tokio::test]
async fn touched_file_is_reindexed_without_duplicates() {
    let h = harness();
    seed(h.dir.path());
    h.indexer.index_project(h.dir.path()).await.unwrap();
    let calls = h.code.call_count();

    let file = std::fs::File::options()
        .write(true)
        .open(h.dir.path().join("src/auth.go"))
        .unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    drop(file);

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.files_unchanged, 2);
    assert_eq!(report.chunks_created, 1);
    assert_eq!(h.code.call_count(), calls + 1);
    assert_eq!(h.store.points(), 4);

    let hits = h
        .retriever
        .search("Login", SearchMode::Code, 10)
        .await
        .unwrap();
    assert_eq!(hits.iter().filter(|h| h.file_path == "src/auth.go").count(), 1);
}

#[tokio::test]
async fn identical_chunks_are_embedded_once() {
    let h = harness();
    let body = "def same():\n    return 1\n";
    write(h.dir.path(), "a.py", body);
    write(h.dir.path(), "b.py", body);

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.provider_calls, 1);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(h.code.call_count(), 1);
    assert_eq!(h.store.points(), 2);

    let hits = h
        .retriever
        .search("same", SearchMode::Code, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn search_before_indexing_reports_missing_index() {
    let h = harness();
    let err = h
        .retriever
        .search("anything", SearchMode::Code, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::IndexNotFound));
}

#[tokio::test]
async fn provider_failure_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = Arc::new(CountingStore::default());
    let chunks = ChunkStore::new(store.clone(), COLLECTION, DIM);
    let failing = Arc::new(MockEmbedder::failing());
    let indexer = CodeIndexer::new(
        chunks,
        failing.clone(),
        failing,
        IndexerConfig {
            embed: embed_config(),
            data_dir: ".scout".into(),
        },
    );

    let err = indexer.index_project(dir.path()).await.unwrap_err();

    assert!(matches!(err, IndexError::Provider { .. }));
    assert_eq!(store.mutations(), 0);
    assert!(!dir.path().join(".scout/metadata.json").exists());
}

#[tokio::test]
async fn script_without_declarations_is_still_searchable() {
    let h = harness();
    write(h.dir.path(), "run.py", "import sys\n\nprint(sys.argv)\n");

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert!(report.chunks_created >= 1);
    let hits = h
        .retriever
        .search("print argv", SearchMode::Code, 5)
        .await
        .unwrap();
    assert!(hits.iter().any(|h| h.file_path == "run.py"));
}

#[tokio::test]
async fn single_source_with_two_functions_and_two_doc_sections() {
    let h = harness();
    write(
        h.dir.path(),
        "src/auth.go",
        "package auth\n\n// Login validates user credentials.\nfunc Login(user string, password string) bool {\n\treturn user != \"\" && password != \"\"\n}\n\n// Logout ends a session.\nfunc Logout(session string) {\n}\n",
    );
    write(
        h.dir.path(),
        "docs/guide.md",
        "# Authentication\n\nUsers log in with a password.\n\n## Tokens\n\nTokens expire after one hour.\n",
    );

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_indexed, 2);
    assert_eq!(report.code_chunks, 2);
    assert_eq!(report.docs_chunks, 2);
    assert_eq!(h.store.points(), 4);

    let hits = h
        .retriever
        .search("Logout session", SearchMode::Code, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.file_path == "src/auth.go"));

    let hits = h
        .retriever
        .search("Login password tokens", SearchMode::Hybrid, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 4);
}

#[tokio::test]
async fn rerun_after_uncommitted_pass_does_not_duplicate() {
    let h = harness();
    write(
        h.dir.path(),
        "lib.py",
        "def first():\n    return 1\n\n\ndef second():\n    return 2\n",
    );
    h.indexer.index_project(h.dir.path()).await.unwrap();
    assert_eq!(h.store.points(), 2);

    // Store writes landed but the metadata commit did not.
    std::fs::remove_file(h.dir.path().join(".scout/metadata.json")).unwrap();

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert_eq!(report.files_indexed, 1);
    assert_eq!(h.store.points(), 2);
}

#[tokio::test]
async fn non_utf8_file_is_indexed_lossily() {
    let h = harness();
    std::fs::write(h.dir.path().join("notes.txt"), b"caf\xe9 au lait\n").unwrap();

    let report = h.indexer.index_project(h.dir.path()).await.unwrap();

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.docs_chunks, 1);
    assert_eq!(h.store.points(), 1);

    let mutations = h.store.mutations();
    let report = h.indexer.index_project(h.dir.path()).await.unwrap();
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(h.store.mutations(), mutations);

    let hits = h
        .retriever
        .search("cafe", SearchMode::Docs, 5)
        .await
        .unwrap();
    assert!(hits[0].content.starts_with("caf\u{fffd} au lait"));
}
