use thiserror::Error;

/// Boxed error surfaced by a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while deriving key strings from an attribute mapping.
///
/// These are always raised before any store call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeygenError {
    #[error("Missing key field: {field}")]
    MissingField { field: String },
    #[error("Incomplete key: field {field} is null")]
    IncompleteKey { field: String },
    #[error("Invalid key token: {0:?}")]
    InvalidToken(String),
}

/// Errors reported by a [`crate::StoreClient`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The condition attached to a write did not hold for the current item.
    #[error("Conditional check failed")]
    ConditionFailed,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    /// Wraps any backend error.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

/// Errors returned by [`crate::Dao`] operations.
#[derive(Debug, Error)]
pub enum DaoError {
    #[error(transparent)]
    Keygen(#[from] KeygenError),
    #[error("{entity_type} already exists: {key}")]
    AlreadyExists {
        entity_type: &'static str,
        key: String,
    },
    #[error("{entity_type} not found: {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },
    /// The item's type attribute names a different value type.
    #[error("Expected {expected} item, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Failure surfaced by the store client, carried as-is.
    #[error(transparent)]
    Backend(BoxError),
}

/// `ConditionFailed` only has a meaning for conditional writes, where the DAO
/// maps it itself. Reaching this conversion with it means the client reported
/// a condition on a read, so it is surfaced as a backend failure.
impl From<StoreError> for DaoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Serialization(msg) => DaoError::Serialization(msg),
            StoreError::Backend(source) => DaoError::Backend(source),
            err @ StoreError::ConditionFailed => DaoError::Backend(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(err: serde_json::Error) -> Self {
        DaoError::Serialization(err.to_string())
    }
}

/// Result type for key generation.
pub type KeygenResult<T> = std::result::Result<T, KeygenError>;

/// Result type for DAO operations.
pub type Result<T> = std::result::Result<T, DaoError>;
