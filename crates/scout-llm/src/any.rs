#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Generates a match over all `AnyEmbedder` variants, binding the inner embedder
/// and evaluating the given expression for each arm.
macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::OpenAi($p) => $expr,
            AnyEmbedder::Ollama($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

/// Runtime-selected embedding backend.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    OpenAi(OpenAiEmbedder),
    Ollama(OllamaEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    fn name(&self) -> &'static str {
        delegate_embedder!(self, |p| p.name())
    }

    fn model(&self) -> &str {
        delegate_embedder!(self, |p| p.model())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        delegate_embedder!(self, |p| p.embed(text).await)
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        delegate_embedder!(self, |p| p.embed_many(texts).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_name_and_model() {
        let any = AnyEmbedder::Ollama(OllamaEmbedder::new(
            "http://localhost:11434",
            "text-model".into(),
        ));
        assert_eq!(any.name(), "ollama");
        assert_eq!(any.model(), "text-model");
    }

    #[test]
    fn openai_variant_delegates() {
        let inner = OpenAiEmbedder::new(
            "http://localhost:8080",
            None,
            "code-model".into(),
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        let any = AnyEmbedder::OpenAi(inner);
        assert_eq!(any.name(), "openai");
        assert_eq!(any.model(), "code-model");
    }
}
