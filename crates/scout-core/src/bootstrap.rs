//! Service construction: config resolution, embedding providers, vector store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use scout_index::ChunkStore;
use scout_index::embedder::EmbedderConfig;
use scout_index::indexer::{CodeIndexer, IndexerConfig};
use scout_index::qdrant::QdrantStore;
use scout_index::retriever::CodeRetriever;
use scout_llm::AnyEmbedder;
use scout_llm::ollama::OllamaEmbedder;
use scout_llm::openai::OpenAiEmbedder;

use crate::config::{Config, ProviderKind};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".scout.toml";

/// Priority: `--config` flag > `SCOUT_CONFIG` env > `.scout.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SCOUT_CONFIG")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load and validate the config at the resolved path.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or holds invalid values.
pub fn load_config(cli: Option<&Path>) -> anyhow::Result<Config> {
    let path = resolve_config_path(cli);
    let mut config = Config::load(&path)?;
    config.validate()?;
    tracing::debug!(
        path = %path.display(),
        provider = %config.embedding.provider,
        collection = %config.store.collection,
        "configuration loaded"
    );
    Ok(config)
}

/// Embedding provider for `model` using the configured backend.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_embedder(config: &Config, model: &str) -> anyhow::Result<AnyEmbedder> {
    let embedding = &config.embedding;
    let embedder = match embedding.provider {
        ProviderKind::Ollama => {
            AnyEmbedder::Ollama(OllamaEmbedder::new(&embedding.base_url, model.to_owned()))
        }
        ProviderKind::OpenAi => AnyEmbedder::OpenAi(
            OpenAiEmbedder::new(
                &embedding.base_url,
                embedding.api_key.clone(),
                model.to_owned(),
                Duration::from_secs(embedding.timeout_seconds),
            )
            .context("failed to build openai embedding client")?,
        ),
    };
    Ok(embedder)
}

#[must_use]
pub fn embedder_config(config: &Config) -> EmbedderConfig {
    let embedding = &config.embedding;
    EmbedderConfig {
        workers: embedding.workers,
        max_attempts: embedding.max_attempts,
        base_backoff: Duration::from_millis(embedding.backoff_ms),
        call_timeout: Duration::from_secs(embedding.timeout_seconds),
        dimension: embedding.dimension,
    }
}

/// Qdrant-backed chunk store for the configured collection.
///
/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn create_chunk_store(config: &Config) -> anyhow::Result<ChunkStore> {
    let qdrant = QdrantStore::new(&config.store.qdrant_url)
        .with_context(|| format!("failed to connect to qdrant at {}", config.store.qdrant_url))?;
    Ok(ChunkStore::new(
        Arc::new(qdrant),
        config.store.collection.clone(),
        config.embedding.dimension,
    ))
}

fn embedder_pair(config: &Config) -> anyhow::Result<(Arc<AnyEmbedder>, Arc<AnyEmbedder>)> {
    let code = create_embedder(config, &config.embedding.code_model)?;
    let docs = create_embedder(config, &config.embedding.docs_model)?;
    Ok((Arc::new(code), Arc::new(docs)))
}

/// # Errors
///
/// Returns an error if a provider or the store cannot be constructed.
pub fn build_indexer(config: &Config) -> anyhow::Result<CodeIndexer<AnyEmbedder>> {
    let (code, docs) = embedder_pair(config)?;
    let indexer_config = IndexerConfig {
        embed: embedder_config(config),
        data_dir: config.store.data_dir.clone(),
    };
    Ok(CodeIndexer::new(
        create_chunk_store(config)?,
        code,
        docs,
        indexer_config,
    ))
}

/// # Errors
///
/// Returns an error if a provider or the store cannot be constructed.
pub fn build_retriever(config: &Config) -> anyhow::Result<CodeRetriever<AnyEmbedder>> {
    let (code, docs) = embedder_pair(config)?;
    Ok(CodeRetriever::new(
        create_chunk_store(config)?,
        code,
        docs,
        embedder_config(config),
    ))
}
