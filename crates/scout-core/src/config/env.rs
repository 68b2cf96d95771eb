use super::{Config, ProviderKind};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SCOUT_PROVIDER") {
            match v.to_ascii_lowercase().as_str() {
                "ollama" => self.embedding.provider = ProviderKind::Ollama,
                "openai" => self.embedding.provider = ProviderKind::OpenAi,
                _ => tracing::warn!("ignoring invalid SCOUT_PROVIDER value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("SCOUT_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("SCOUT_API_KEY") {
            self.embedding.api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Ok(v) = std::env::var("SCOUT_CODE_MODEL") {
            self.embedding.code_model = v;
        }
        if let Ok(v) = std::env::var("SCOUT_DOCS_MODEL") {
            self.embedding.docs_model = v;
        }
        if let Ok(v) = std::env::var("SCOUT_DIMENSION") {
            if let Ok(dim) = v.parse::<usize>() {
                self.embedding.dimension = dim;
            } else {
                tracing::warn!("ignoring invalid SCOUT_DIMENSION value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCOUT_WORKERS") {
            if let Ok(n) = v.parse::<usize>() {
                self.embedding.workers = n;
            } else {
                tracing::warn!("ignoring invalid SCOUT_WORKERS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SCOUT_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("SCOUT_COLLECTION") {
            self.store.collection = v;
        }
    }
}
