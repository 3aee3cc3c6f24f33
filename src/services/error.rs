use thiserror::Error;

/// Business-level failure of a service call. Every variant except
/// `Database` and `Internal` renders as an HTTP 200 envelope with
/// `success: false`; malformed request bodies never reach the services (the
/// JSON extractor rejects them with 422).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// The requested transition is not legal from the record's current state.
    #[error("{0}")]
    InvalidState(String),

    /// The activity has no room for the requested counter change.
    #[error("{0}")]
    Capacity(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Validation(String),

    /// Stored state contradicts an invariant the schema should uphold.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
