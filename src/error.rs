use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Live query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Live query failed: {0}")]
    LiveQuery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    /// Short text shown inside an error placeholder suggestion.
    pub fn hint(&self) -> String {
        match self {
            Error::Database(sqlx::Error::Database(db)) => db.message().to_string(),
            other => other.to_string(),
        }
    }
}
