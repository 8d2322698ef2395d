use uuid::Uuid;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failures of the user table
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No row has this id
    #[error("No user with id {0}")]
    UserNotFound(Uuid),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// A lookup named a column the users table does not have, or a value it cannot hold
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
