/// Infrastructure-level database failure.
///
/// Domain crates classify driver errors themselves; this type covers what
/// happens before a repository exists (connecting, probing).
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
