use std::future::Future;

use crate::error::EmbedError;

/// A remote model that turns text into a fixed-width vector.
///
/// Implementations perform a single attempt per call. Retry, backoff and call
/// budgeting are the caller's responsibility.
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or the response is malformed.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    /// Embed several texts, returning vectors in input order.
    ///
    /// The default implementation issues one `embed` call per text.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the backend.
    fn embed_many(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbedError>> + Send {
        async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }
}
