use thiserror::Error;

/// Result type for binding, redirect and import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors reported by a binding store.
///
/// The services never wrap or retry these; they reach the caller inside
/// [`Error::Storage`] exactly as the store produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("id already exists: {0}")]
    DuplicateId(String),
    #[error("id not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("id '{0}' contains characters outside the configured alphabet")]
    InvalidAlphabet(String),
    #[error("id '{id}' has length {actual}, required {required}")]
    InvalidLength {
        id: String,
        actual: usize,
        required: usize,
    },
    #[error("expiration out of range: {0}")]
    ExpirationOutOfRange(String),
    #[error("url expired")]
    UrlExpired,
    #[error("url exhausted its request limit")]
    UrlExhausted,
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    /// Returns `true` if the store reported the id as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::NotFound(_)))
    }

    /// Returns `true` if the store rejected an insert because the id is taken.
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, Error::Storage(StorageError::DuplicateId(_)))
    }
}
