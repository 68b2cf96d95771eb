//! Persisted per-file modification times.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

pub const METADATA_FILE: &str = "metadata.json";

/// What the vector store currently holds, keyed by relative file path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    #[serde(default)]
    pub last_index_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_mod_times: BTreeMap<String, DateTime<Utc>>,
}

/// JSON file holding [`IndexMetadata`], written atomically.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Metadata file inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(METADATA_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the metadata. A missing file is the empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn load(&self) -> Result<IndexMetadata> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(IndexMetadata::default());
            }
            Err(e) => {
                return Err(IndexError::Metadata(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| IndexError::Metadata(format!("decode {}: {e}", self.path.display())))
    }

    /// Replace the metadata file via write-to-temp and rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file written.
    pub async fn save(&self, metadata: &IndexMetadata) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(metadata)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            IndexError::Metadata(format!("replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}
