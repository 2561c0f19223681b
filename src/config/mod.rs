//! Cache record persistence

pub mod schema;

pub use schema::CacheRecord;

use crate::error::{TgoError, TgoResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the record inside the cache directory
pub const CONFIG_FILE: &str = "config.toml";

/// Loads and persists the cache record of one workspace
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the record inside `cache_dir`
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            config_path: cache_dir.join(CONFIG_FILE),
        }
    }

    /// Load the record; `None` means the cache was never initialized
    pub async fn load(&self) -> TgoResult<Option<CacheRecord>> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache record at {}", self.config_path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(TgoError::io(
                    format!("reading cache record {}", self.config_path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| TgoError::config_invalid(&self.config_path, e.to_string()))
    }

    /// Persist the record, replacing any previous one in a single rename
    pub async fn persist(&self, record: &CacheRecord) -> TgoResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TgoError::io(format!("creating {}", parent.display()), e))?;
        }

        let content = toml::to_string_pretty(record)?;
        let tmp_path = self.config_path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| TgoError::io(format!("writing {}", tmp_path.display()), e))?;
        fs::rename(&tmp_path, &self.config_path).await.map_err(|e| {
            TgoError::io(
                format!("writing cache record {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Cache record saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the record file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
