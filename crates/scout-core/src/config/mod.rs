mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Normalise and check values that would otherwise fail mid-pass.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending value.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let embedding = &mut self.embedding;
        embedding.base_url = embedding.base_url.trim_end_matches('/').to_owned();
        check_http_url("embedding.base_url", &embedding.base_url)?;
        check_http_url("store.qdrant_url", &self.store.qdrant_url)?;

        for (field, value) in [
            ("embedding.code_model", &embedding.code_model),
            ("embedding.docs_model", &embedding.docs_model),
            ("store.collection", &self.store.collection),
            ("store.data_dir", &self.store.data_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }

        for (field, value) in [
            ("embedding.dimension", embedding.dimension as u64),
            ("embedding.workers", embedding.workers as u64),
            ("embedding.max_attempts", u64::from(embedding.max_attempts)),
            ("embedding.timeout_seconds", embedding.timeout_seconds),
            ("search.limit", self.search.limit as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
            }
        }
        Ok(())
    }
}

fn check_http_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::Invalid(format!("{field} `{raw}` is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{field} must use http or https, got `{other}`"
        ))),
    }
}
