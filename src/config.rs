//! # Configuration
//!
//! Settings are read from a `config.toml`. Every section and field is
//! optional; anything missing falls back to its default.
//!
//! ```toml
//! [storage]
//! backend = "file"
//! path = "."
//!
//! [board]
//! title = "Team Board"
//! columns = ["Backlog", "Doing", "Done"]
//! untitled = "New column"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

#[cfg(feature = "file-storage")]
use crate::storage::FileStorage;
#[cfg(feature = "sqlite-storage")]
use crate::storage::SqliteStorage;
use crate::{
    domain::{DEFAULT_COLUMNS, UNTITLED_COLUMN},
    error::{KanbanError, Result},
    storage::{InMemoryStorage, Storage},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs;

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Project root for the file backend, database file for SQLite
    pub path: Option<PathBuf>,
}

/// What a newly created board looks like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDefaults {
    pub title: String,
    pub columns: Vec<String>,
    /// Title given to columns created with a blank name
    pub untitled: String,
}

impl Default for BoardDefaults {
    fn default() -> Self {
        Self {
            title: "My Board".to_string(),
            columns: DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            untitled: UNTITLED_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `kanban_core=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanConfig {
    pub storage: StorageConfig,
    pub board: BoardDefaults,
    pub logging: LoggingConfig,
}

impl KanbanConfig {
    pub const CONFIG_FILE: &'static str = "config.toml";

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads the configuration file; a missing file yields the defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }

    /// Builds the configured storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        match self.storage.backend {
            StorageBackend::Memory => Ok(Arc::new(InMemoryStorage::new())),
            #[cfg(feature = "file-storage")]
            StorageBackend::File => {
                let root = self.storage.path.clone().unwrap_or_else(|| PathBuf::from("."));
                Ok(Arc::new(FileStorage::new(root)))
            }
            #[cfg(feature = "sqlite-storage")]
            StorageBackend::Sqlite => {
                let path = self.storage.path.as_ref().ok_or_else(|| {
                    KanbanError::ConfigError("storage.path is required for sqlite".to_string())
                })?;
                Ok(Arc::new(SqliteStorage::new(path)?))
            }
            #[allow(unreachable_patterns)]
            backend => Err(KanbanError::ConfigError(format!(
                "storage backend {:?} is not enabled in this build",
                backend
            ))),
        }
    }
}
