//! Test-only mock embedding provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Deterministic bag-of-tokens embedder.
///
/// Every identifier-like token of the input is hashed into one bucket of the
/// output vector, so texts sharing tokens land close to each other. Clones
/// share their call counter.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub model: String,
    pub dimension: usize,
    /// Number of leading calls that fail before the embedder starts succeeding.
    pub fail_first: usize,
    pub always_fail: bool,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            model: "mock-embed".into(),
            dimension: 64,
            fail_first: 0,
            always_fail: false,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_failures(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Total number of `embed` calls observed, failed ones included.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension.max(1)];
        let len = vector.len() as u64;
        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
        {
            let bucket = usize::try_from(fnv1a(&token.to_lowercase()) % len).unwrap_or(0);
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.always_fail || call < self.fail_first {
            return Err(EmbedError::Other("mock embedding error".into()));
        }
        Ok(self.vector_for(text))
    }
}
