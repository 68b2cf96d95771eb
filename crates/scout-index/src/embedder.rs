//! Deduplicating parallel embedding of chunk texts.
//!
//! Texts are fingerprinted with blake3; only the first occurrence of each
//! fingerprint reaches the provider. Unique jobs are drained from a shared
//! queue by a bounded set of tokio tasks and every result carries the index it
//! belongs to, so output order matches input order regardless of completion
//! order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scout_llm::{EmbedError, EmbeddingProvider};
use tokio::sync::{Mutex, mpsc};

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Copy)]
pub struct EmbedderConfig {
    pub workers: usize,
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub call_timeout: Duration,
    /// Storage width every vector is padded to.
    pub dimension: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
            call_timeout: Duration::from_secs(60),
            dimension: 3584,
        }
    }
}

/// Vectors in input order plus call accounting.
#[derive(Debug, Default)]
pub struct EmbedOutcome {
    pub vectors: Vec<Vec<f32>>,
    pub provider_calls: usize,
    pub duplicates: usize,
}

struct Job {
    slot: usize,
    text: String,
}

/// Embed `texts`, calling the provider once per distinct text.
///
/// # Errors
///
/// Returns the first provider failure that survived every retry, or
/// [`IndexError::Dimension`] when a vector is wider than the storage width.
pub async fn embed_texts<P>(
    provider: &Arc<P>,
    texts: &[String],
    config: EmbedderConfig,
) -> Result<EmbedOutcome>
where
    P: EmbeddingProvider + 'static,
{
    if texts.is_empty() {
        return Ok(EmbedOutcome::default());
    }

    let mut first_seen: HashMap<blake3::Hash, usize> = HashMap::with_capacity(texts.len());
    let mut slot_of = Vec::with_capacity(texts.len());
    let mut jobs = Vec::new();
    for text in texts {
        let next = jobs.len();
        let slot = *first_seen
            .entry(blake3::hash(text.as_bytes()))
            .or_insert_with(|| {
                jobs.push(Job {
                    slot: next,
                    text: text.clone(),
                });
                next
            });
        slot_of.push(slot);
    }

    let unique = jobs.len();
    let duplicates = texts.len() - unique;
    tracing::debug!(
        provider = provider.name(),
        total = texts.len(),
        unique,
        duplicates,
        "embedding chunk texts"
    );

    let results = run_pool(provider, jobs, config).await?;
    let vectors = slot_of.into_iter().map(|slot| results[slot].clone()).collect();

    Ok(EmbedOutcome {
        vectors,
        provider_calls: unique,
        duplicates,
    })
}

async fn run_pool<P>(
    provider: &Arc<P>,
    jobs: Vec<Job>,
    config: EmbedderConfig,
) -> Result<Vec<Vec<f32>>>
where
    P: EmbeddingProvider + 'static,
{
    let unique = jobs.len();
    let (job_tx, job_rx) = mpsc::channel::<Job>(unique);
    for job in jobs {
        job_tx
            .send(job)
            .await
            .map_err(|_| IndexError::Other("embedding job queue closed".into()))?;
    }
    drop(job_tx);

    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<Result<(usize, Vec<f32>)>>();
    let stop = Arc::new(AtomicBool::new(false));

    for _ in 0..config.workers.clamp(1, unique) {
        let provider = Arc::clone(provider);
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                let Some(job) = job_rx.lock().await.recv().await else {
                    break;
                };
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                match embed_with_retry(provider.as_ref(), &job.text, &config).await {
                    Ok(vector) => {
                        if result_tx.send(Ok((job.slot, vector))).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        stop.store(true, Ordering::SeqCst);
                        let _ = result_tx.send(Err(e));
                        break;
                    }
                }
            }
        });
    }
    drop(result_tx);

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; unique];
    while let Some(result) = result_rx.recv().await {
        match result {
            Ok((slot, vector)) => slots[slot] = Some(pad_to(vector, config.dimension)?),
            Err(e) => {
                stop.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }
    }

    slots
        .into_iter()
        .map(|v| v.ok_or_else(|| IndexError::Other("embedding worker exited early".into())))
        .collect()
}

/// Zero-pad `vector` to `dimension`.
///
/// # Errors
///
/// Returns [`IndexError::Dimension`] if the vector is wider than `dimension`.
pub fn pad_to(mut vector: Vec<f32>, dimension: usize) -> Result<Vec<f32>> {
    if vector.len() > dimension {
        return Err(IndexError::Dimension {
            expected: dimension,
            got: vector.len(),
        });
    }
    vector.resize(dimension, 0.0);
    Ok(vector)
}

/// One provider call per attempt, each bounded by `call_timeout`, with
/// exponential backoff between attempts.
///
/// # Errors
///
/// Returns [`IndexError::Provider`] once `max_attempts` calls have failed.
pub async fn embed_with_retry<P: EmbeddingProvider>(
    provider: &P,
    text: &str,
    config: &EmbedderConfig,
) -> Result<Vec<f32>> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0_u32;
    loop {
        let outcome = match tokio::time::timeout(config.call_timeout, provider.embed(text)).await {
            Ok(Ok(vector)) if vector.is_empty() => Err(EmbedError::EmptyResponse {
                provider: provider.name(),
            }),
            Ok(result) => result,
            Err(_) => Err(EmbedError::Timeout(config.call_timeout)),
        };
        attempt += 1;
        match outcome {
            Ok(vector) => return Ok(vector),
            Err(source) if attempt >= max_attempts => {
                return Err(IndexError::Provider {
                    provider: provider.name(),
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                let delay = config
                    .base_backoff
                    .saturating_mul(1_u32 << (attempt - 1).min(16));
                tracing::warn!(
                    provider = provider.name(),
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %e,
                    "embedding call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
