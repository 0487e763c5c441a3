//! Error types for the offline store

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Student ID already exists: {0}")]
    DuplicateIdentity(String),

    #[error("Student not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Password hashing error: {0}")]
    Hash(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the error came from durable storage rather than the caller.
    ///
    /// Callers must not assume anything was persisted when this is true.
    pub fn is_io_failure(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Io(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for StoreError {
    fn from(e: bcrypt::BcryptError) -> Self {
        StoreError::Hash(e.to_string())
    }
}
