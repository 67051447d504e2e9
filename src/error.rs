use thiserror::Error;

pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Board not initialized")]
    BoardNotInitialized,

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Already deleted: {0}")]
    AlreadyDeleted(String),

    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[cfg(feature = "sqlite-storage")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

/// Coarse classification of a failure, as seen by the sync layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationFailure,
    TransientIoFailure,
    AlreadyDeleted,
    Other,
}

impl KanbanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::BoardNotInitialized => ErrorKind::NotFound,
            Self::ValidationFailure(_) => ErrorKind::ValidationFailure,
            Self::AlreadyDeleted(_) => ErrorKind::AlreadyDeleted,
            Self::TransientIo(_) | Self::StorageError(_) | Self::IoError(_) => {
                ErrorKind::TransientIoFailure
            }
            #[cfg(feature = "sqlite-storage")]
            Self::SqliteError(_) => ErrorKind::TransientIoFailure,
            Self::SerializationError(_) | Self::ConfigError(_) => ErrorKind::Other,
        }
    }

    /// True for the delete-of-a-missing-entity case, which callers treat as success
    pub fn is_already_deleted(&self) -> bool {
        self.kind() == ErrorKind::AlreadyDeleted
    }
}

impl From<toml::de::Error> for KanbanError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
