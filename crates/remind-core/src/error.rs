use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid recurrence pattern: {0}. Use daily, weekly, monthly or yearly")]
    InvalidPattern(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream service failed: {0}")]
    Upstream(String),
}

impl CoreError {
    /// True for errors the caller caused by sending bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::InvalidPattern(_))
    }
}
